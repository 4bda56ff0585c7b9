use fircg_types::PhysicalType;

/// Extra information about how one physical slot is passed, per the target
/// calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    alignment: u16,
    by_val: bool,
    sret: bool,
    append: bool,
}

impl Attributes {
    pub const fn new() -> Self {
        Attributes {
            alignment: 0,
            by_val: false,
            sret: false,
            append: false,
        }
    }

    pub const fn with_alignment(mut self, alignment: u16) -> Self {
        self.alignment = alignment;
        self
    }

    /// The slot is a reference to a caller-owned copy of the value.
    pub const fn by_val(mut self) -> Self {
        self.by_val = true;
        self
    }

    /// The slot is the hidden reference the callee writes its result through.
    pub const fn sret(mut self) -> Self {
        self.sret = true;
        self
    }

    /// The slot goes after every declared parameter.
    pub const fn append(mut self) -> Self {
        self.append = true;
        self
    }

    pub fn alignment(&self) -> Option<u16> {
        (self.alignment != 0).then_some(self.alignment)
    }

    pub fn is_by_val(&self) -> bool {
        self.by_val
    }

    pub fn is_sret(&self) -> bool {
        self.sret
    }

    pub fn is_append(&self) -> bool {
        self.append
    }
}

/// How one logical value maps onto zero or more physical slots.
pub type Marshalling = Vec<(PhysicalType, Attributes)>;
