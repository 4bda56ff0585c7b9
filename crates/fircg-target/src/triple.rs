//! Maps a target triple onto one of the supported ABI families.

use crate::error::{TargetError, TargetResult};
use std::fmt;
use std::str::FromStr;
use target_lexicon::{Aarch64Architecture, Architecture, OperatingSystem, Triple};

/// Triple used when the caller asks for the default target.
pub const DEFAULT_TRIPLE: &str = "x86_64-unknown-linux-gnu";

/// The closed set of ABI families with a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetAbi {
    I386,
    X86_64,
    AArch64,
}

impl TargetAbi {
    /// Picks the ABI family for a triple. Only Linux and Darwin are known.
    pub fn select(triple: &Triple) -> TargetResult<Self> {
        let abi = match triple.architecture {
            Architecture::X86_32(_) => TargetAbi::I386,
            Architecture::X86_64 => TargetAbi::X86_64,
            Architecture::Aarch64(Aarch64Architecture::Aarch64) => TargetAbi::AArch64,
            _ => return Err(unsupported(triple)),
        };
        match triple.operating_system {
            OperatingSystem::Linux | OperatingSystem::Darwin => Ok(abi),
            _ => Err(unsupported(triple)),
        }
    }

    /// Width of the target's default integer word.
    pub fn default_width(self) -> u32 {
        match self {
            TargetAbi::I386 => 32,
            TargetAbi::X86_64 | TargetAbi::AArch64 => 64,
        }
    }
}

impl fmt::Display for TargetAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetAbi::I386 => "i386",
            TargetAbi::X86_64 => "x86_64",
            TargetAbi::AArch64 => "aarch64",
        };
        f.write_str(name)
    }
}

fn unsupported(triple: &Triple) -> TargetError {
    TargetError::UnsupportedTarget { triple: triple.to_string() }
}

/// Resolves the `--target` style spelling: `""` and `"default"` select
/// [`DEFAULT_TRIPLE`], `"native"` selects the host.
pub fn determine_target_triple(triple: &str) -> String {
    match triple {
        "" | "default" => DEFAULT_TRIPLE.to_string(),
        "native" => Triple::host().to_string(),
        other => other.to_string(),
    }
}

/// Parses a triple string after resolving the special spellings.
pub fn parse_triple(triple: &str) -> TargetResult<Triple> {
    let resolved = determine_target_triple(triple);
    Triple::from_str(&resolved).map_err(|e| TargetError::InvalidTriple {
        triple: resolved.clone(),
        reason: e.to_string(),
    })
}
