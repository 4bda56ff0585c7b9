//! Kind mapping: resolves the abstract size-class tag of a scalar type to a
//! concrete bit width or floating-point format.

use crate::error::{TypeError, TypeResult};
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;

/// Abstract size-class tag of a scalar type.
pub type KindTy = u32;

/// Floating-point formats a real or complex kind can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatClass {
    Half,
    BFloat,
    Single,
    Double,
    X87Extended,
    Quad,
    PpcDoubleDouble,
}

impl FloatClass {
    /// Storage width in bits (the x87 format occupies 80 significant bits).
    pub fn bit_width(self) -> u32 {
        match self {
            FloatClass::Half | FloatClass::BFloat => 16,
            FloatClass::Single => 32,
            FloatClass::Double => 64,
            FloatClass::X87Extended => 80,
            FloatClass::Quad | FloatClass::PpcDoubleDouble => 128,
        }
    }

    /// Name used in kind map strings.
    pub fn map_name(self) -> &'static str {
        match self {
            FloatClass::Half => "Half",
            FloatClass::BFloat => "BFloat",
            FloatClass::Single => "Float",
            FloatClass::Double => "Double",
            FloatClass::X87Extended => "X86_FP80",
            FloatClass::Quad => "FP128",
            FloatClass::PpcDoubleDouble => "PPC_FP128",
        }
    }

    fn from_map_name(name: &str) -> Option<Self> {
        match name {
            "Half" => Some(FloatClass::Half),
            "BFloat" => Some(FloatClass::BFloat),
            "Float" => Some(FloatClass::Single),
            "Double" => Some(FloatClass::Double),
            "X86_FP80" => Some(FloatClass::X87Extended),
            "FP128" => Some(FloatClass::Quad),
            "PPC_FP128" => Some(FloatClass::PpcDoubleDouble),
            _ => None,
        }
    }
}

impl fmt::Display for FloatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FloatClass::Half => "half",
            FloatClass::BFloat => "bfloat",
            FloatClass::Single => "float",
            FloatClass::Double => "double",
            FloatClass::X87Extended => "x86_fp80",
            FloatClass::Quad => "fp128",
            FloatClass::PpcDoubleDouble => "ppc_fp128",
        };
        f.write_str(name)
    }
}

/// Intrinsic type categories addressed by a kind map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindCategory {
    Character,
    Complex,
    Integer,
    Logical,
    Real,
}

impl KindCategory {
    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'a' => Some(KindCategory::Character),
            'c' => Some(KindCategory::Complex),
            'i' => Some(KindCategory::Integer),
            'l' => Some(KindCategory::Logical),
            'r' => Some(KindCategory::Real),
            _ => None,
        }
    }

    fn is_float_like(self) -> bool {
        matches!(self, KindCategory::Complex | KindCategory::Real)
    }
}

/// Default kind of each intrinsic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultKinds {
    pub character: KindTy,
    pub complex: KindTy,
    pub double: KindTy,
    pub integer: KindTy,
    pub logical: KindTy,
    pub real: KindTy,
}

impl Default for DefaultKinds {
    fn default() -> Self {
        DefaultKinds {
            character: 1,
            complex: 4,
            double: 8,
            integer: 4,
            logical: 4,
            real: 4,
        }
    }
}

/// Maps kinds to bit widths (integer, logical, character) and floating-point
/// formats (real, complex). Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KindMapping {
    bit_widths: FxHashMap<(KindCategory, KindTy), u32>,
    float_classes: FxHashMap<(KindCategory, KindTy), FloatClass>,
    defaults: DefaultKinds,
}

impl KindMapping {
    /// Mapping with the built-in defaults only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated override string such as
    /// `"i10:80,l3:24,a1:8,r54:Double,c20:X86_FP80"` on top of the defaults.
    pub fn parse(map: &str) -> TypeResult<Self> {
        let mut mapping = Self::default();
        for entry in map.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            mapping.apply_entry(entry)?;
        }
        Ok(mapping)
    }

    /// Replaces the default kinds.
    pub fn with_defaults(mut self, defaults: DefaultKinds) -> Self {
        self.defaults = defaults;
        self
    }

    fn apply_entry(&mut self, entry: &str) -> TypeResult<()> {
        let mut chars = entry.chars();
        let letter = chars
            .next()
            .ok_or_else(|| TypeError::MalformedKindEntry { entry: entry.to_string() })?;
        let category = KindCategory::from_letter(letter).ok_or_else(|| {
            TypeError::UnknownKindCategory {
                entry: entry.to_string(),
                letter,
            }
        })?;
        let (kind, value) = chars
            .as_str()
            .split_once(':')
            .ok_or_else(|| TypeError::MalformedKindEntry { entry: entry.to_string() })?;
        let kind = KindTy::from_str(kind)
            .map_err(|_| TypeError::InvalidKindValue { entry: entry.to_string() })?;

        if category.is_float_like() {
            let class = FloatClass::from_map_name(value).ok_or_else(|| {
                TypeError::UnknownFloatFormat {
                    entry: entry.to_string(),
                    name: value.to_string(),
                }
            })?;
            self.float_classes.insert((category, kind), class);
        } else {
            let width = match u32::from_str(value) {
                Ok(width) if width > 0 => width,
                _ => return Err(TypeError::InvalidBitWidth { entry: entry.to_string() }),
            };
            self.bit_widths.insert((category, kind), width);
        }
        Ok(())
    }

    // Unmapped kinds are a byte count; `None` when that overflows the width.
    fn bit_width(&self, category: KindCategory, kind: KindTy) -> Option<u32> {
        self.bit_widths
            .get(&(category, kind))
            .copied()
            .or_else(|| kind.checked_mul(8))
    }

    pub fn integer_bit_width(&self, kind: KindTy) -> Option<u32> {
        self.bit_width(KindCategory::Integer, kind)
    }

    pub fn logical_bit_width(&self, kind: KindTy) -> Option<u32> {
        self.bit_width(KindCategory::Logical, kind)
    }

    pub fn character_bit_width(&self, kind: KindTy) -> Option<u32> {
        self.bit_width(KindCategory::Character, kind)
    }

    /// Floating-point format of a real kind, `None` when the kind has no format.
    pub fn real_class(&self, kind: KindTy) -> Option<FloatClass> {
        self.float_classes
            .get(&(KindCategory::Real, kind))
            .copied()
            .or_else(|| default_float_class(kind))
    }

    /// Floating-point format of each part of a complex kind. Falls back to
    /// the real format of the same kind.
    pub fn complex_class(&self, kind: KindTy) -> Option<FloatClass> {
        self.float_classes
            .get(&(KindCategory::Complex, kind))
            .copied()
            .or_else(|| self.real_class(kind))
    }

    pub fn defaults(&self) -> &DefaultKinds {
        &self.defaults
    }

    pub fn default_integer_kind(&self) -> KindTy {
        self.defaults.integer
    }

    pub fn default_character_kind(&self) -> KindTy {
        self.defaults.character
    }

    pub fn default_real_kind(&self) -> KindTy {
        self.defaults.real
    }
}

fn default_float_class(kind: KindTy) -> Option<FloatClass> {
    match kind {
        2 => Some(FloatClass::Half),
        3 => Some(FloatClass::BFloat),
        4 => Some(FloatClass::Single),
        8 => Some(FloatClass::Double),
        10 => Some(FloatClass::X87Extended),
        16 => Some(FloatClass::Quad),
        _ => None,
    }
}

impl FromStr for KindMapping {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KindMapping::parse(s)
    }
}
