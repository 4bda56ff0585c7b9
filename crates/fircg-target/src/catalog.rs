//! Per-target rules for laying out and passing complex numbers and boxed
//! characters.
//!
//! The memory layouts are the same everywhere; only the argument and return
//! marshalling differ, and those differences are captured in one small rule
//! table per [`TargetAbi`].

use crate::error::{AbiError, AbiResult, TargetResult};
use crate::marshal::{Attributes, Marshalling};
use crate::triple::{parse_triple, TargetAbi};
use fircg_types::{FloatClass, KindMapping, PhysicalType};
use std::sync::Arc;
use target_lexicon::Triple;

/// How a complex value of one precision crosses a call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComplexPassing {
    /// Hidden reference to a caller-owned `{e, e}` copy.
    ByValReference { align: u16 },
    /// One `<2 x e>` vector register.
    Vector,
    /// Two separate scalar slots.
    SplitScalars,
    /// Both lanes packed into one `i64`.
    PackedInteger,
    /// Hidden result reference to `{e, e}`.
    HiddenResult { align: u16 },
    /// A genuine `{e, e}` value.
    StructValue,
}

#[derive(Debug, Clone, Copy)]
struct PrecisionRules {
    single: ComplexPassing,
    double: ComplexPassing,
}

#[derive(Debug)]
struct AbiRules {
    complex_argument: PrecisionRules,
    complex_return: PrecisionRules,
}

static I386_RULES: AbiRules = AbiRules {
    complex_argument: PrecisionRules {
        single: ComplexPassing::ByValReference { align: 4 },
        double: ComplexPassing::ByValReference { align: 4 },
    },
    complex_return: PrecisionRules {
        single: ComplexPassing::PackedInteger,
        double: ComplexPassing::HiddenResult { align: 4 },
    },
};

// x86-64 and AArch64 share the same complex conventions.
static LP64_RULES: AbiRules = AbiRules {
    complex_argument: PrecisionRules {
        single: ComplexPassing::Vector,
        double: ComplexPassing::SplitScalars,
    },
    complex_return: PrecisionRules {
        single: ComplexPassing::Vector,
        double: ComplexPassing::StructValue,
    },
};

impl TargetAbi {
    fn rules(self) -> &'static AbiRules {
        match self {
            TargetAbi::I386 => &I386_RULES,
            TargetAbi::X86_64 | TargetAbi::AArch64 => &LP64_RULES,
        }
    }
}

/// Target-specific representation rules. One per compilation, immutable
/// once built, and safe to share between threads.
#[derive(Debug, Clone)]
pub struct AbiCatalog {
    abi: TargetAbi,
    triple: Triple,
    kind_map: Arc<KindMapping>,
}

impl AbiCatalog {
    /// Builds the catalog for `triple`. Fails before any type is converted
    /// when the triple has no rule table.
    pub fn new(triple: Triple, kind_map: Arc<KindMapping>) -> TargetResult<Self> {
        let abi = TargetAbi::select(&triple)?;
        log::debug!("selected {} ABI catalog for {}", abi, triple);
        Ok(AbiCatalog { abi, triple, kind_map })
    }

    /// Parses `triple` (accepting `default` and `native`) and builds the catalog.
    pub fn from_triple_str(triple: &str, kind_map: Arc<KindMapping>) -> TargetResult<Self> {
        Self::new(parse_triple(triple)?, kind_map)
    }

    pub fn abi(&self) -> TargetAbi {
        self.abi
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn kind_map(&self) -> &Arc<KindMapping> {
        &self.kind_map
    }

    /// Width of the length slot of a boxed character and of descriptor indices.
    pub fn default_width(&self) -> u32 {
        self.abi.default_width()
    }

    /// `{e, e}` on every target.
    pub fn complex_memory_type(&self, element: &PhysicalType) -> PhysicalType {
        complex_pair(element)
    }

    /// Slots for a complex argument passed by value.
    pub fn complex_argument_type(&self, element: &PhysicalType) -> AbiResult<Marshalling> {
        let passing = self.complex_rule(self.abi.rules().complex_argument, element, "argument")?;
        Ok(self.marshal_complex(passing, element))
    }

    /// Slots for a complex return value. May turn into a hidden result argument.
    pub fn complex_return_type(&self, element: &PhysicalType) -> AbiResult<Marshalling> {
        let passing = self.complex_rule(self.abi.rules().complex_return, element, "return value")?;
        Ok(self.marshal_complex(passing, element))
    }

    /// `{e*, iW}` where `W` is the target default width.
    pub fn boxchar_memory_type(&self, element: &PhysicalType) -> PhysicalType {
        PhysicalType::literal_struct(vec![
            PhysicalType::pointer_to(element.clone()),
            PhysicalType::int(self.default_width()),
        ])
    }

    /// Slots for a boxed character argument. The address keeps the declared
    /// position while the length goes after all declared parameters, unless
    /// this pair is the hidden CHARACTER result, whose length stays adjacent.
    pub fn boxchar_argument_type(&self, element: &PhysicalType, is_hidden_result: bool) -> Marshalling {
        let len_attrs = if is_hidden_result {
            Attributes::new()
        } else {
            Attributes::new().append()
        };
        vec![
            (PhysicalType::pointer_to(element.clone()), Attributes::new()),
            (PhysicalType::int(self.default_width()), len_attrs),
        ]
    }

    fn complex_rule(
        &self,
        rules: PrecisionRules,
        element: &PhysicalType,
        position: &str,
    ) -> AbiResult<ComplexPassing> {
        match element {
            PhysicalType::Float(FloatClass::Single) => Ok(rules.single),
            PhysicalType::Float(FloatClass::Double) => Ok(rules.double),
            other => Err(AbiError::UnsupportedConstruct {
                construct: format!("complex {} with {} parts", position, other),
                target: self.triple.to_string(),
            }),
        }
    }

    fn marshal_complex(&self, passing: ComplexPassing, element: &PhysicalType) -> Marshalling {
        match passing {
            ComplexPassing::ByValReference { align } => vec![(
                PhysicalType::pointer_to(complex_pair(element)),
                Attributes::new().with_alignment(align).by_val(),
            )],
            ComplexPassing::Vector => {
                vec![(PhysicalType::vector_of(element.clone(), 2), Attributes::new())]
            }
            ComplexPassing::SplitScalars => vec![
                (element.clone(), Attributes::new()),
                (element.clone(), Attributes::new()),
            ],
            ComplexPassing::PackedInteger => vec![(PhysicalType::int(64), Attributes::new())],
            ComplexPassing::HiddenResult { align } => vec![(
                PhysicalType::pointer_to(complex_pair(element)),
                Attributes::new().with_alignment(align).sret(),
            )],
            ComplexPassing::StructValue => vec![(complex_pair(element), Attributes::new())],
        }
    }
}

fn complex_pair(element: &PhysicalType) -> PhysicalType {
    PhysicalType::literal_struct(vec![element.clone(), element.clone()])
}
