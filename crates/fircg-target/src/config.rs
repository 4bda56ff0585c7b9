use crate::catalog::AbiCatalog;
use crate::error::TargetResult;
use fircg_types::{DefaultKinds, KindMapping};
use std::sync::Arc;

/// Per-compilation target options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetConfig {
    /// Target triple, or `""`/`"default"`/`"native"`.
    pub triple: String,
    /// Kind map override string, e.g. `"i10:80,r16:FP128"`.
    pub kind_map: String,
    pub default_kinds: DefaultKinds,
}

impl TargetConfig {
    pub fn new(triple: impl Into<String>) -> Self {
        TargetConfig {
            triple: triple.into(),
            ..Default::default()
        }
    }

    pub fn with_kind_map(mut self, kind_map: impl Into<String>) -> Self {
        self.kind_map = kind_map.into();
        self
    }

    pub fn with_default_kinds(mut self, default_kinds: DefaultKinds) -> Self {
        self.default_kinds = default_kinds;
        self
    }

    pub fn kind_mapping(&self) -> TargetResult<KindMapping> {
        Ok(KindMapping::parse(&self.kind_map)?.with_defaults(self.default_kinds))
    }

    /// Builds the one catalog this compilation will use.
    pub fn build(&self) -> TargetResult<AbiCatalog> {
        let kind_map = Arc::new(self.kind_mapping()?);
        AbiCatalog::from_triple_str(&self.triple, kind_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TargetError;
    use crate::triple::TargetAbi;

    #[test]
    fn empty_config_is_default_target() {
        let catalog = TargetConfig::default().build().unwrap();
        assert_eq!(catalog.abi(), TargetAbi::X86_64);
        assert_eq!(catalog.kind_map().integer_bit_width(4), Some(32));
    }

    #[test]
    fn kind_map_and_defaults_are_applied() {
        let defaults = DefaultKinds { integer: 8, ..DefaultKinds::default() };
        let catalog = TargetConfig::new("aarch64-unknown-linux-gnu")
            .with_kind_map("i8:128")
            .with_default_kinds(defaults)
            .build()
            .unwrap();
        assert_eq!(catalog.kind_map().default_integer_kind(), 8);
        assert_eq!(catalog.kind_map().integer_bit_width(8), Some(128));
    }

    #[test]
    fn bad_kind_map_is_reported() {
        let err = TargetConfig::new("default").with_kind_map("q1:8").build().unwrap_err();
        assert!(matches!(err, TargetError::KindMap(_)));
    }
}
