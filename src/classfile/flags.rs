/// Field modifier bit-set, immutable after descriptor construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldFlags(u16);

impl FieldFlags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ENUM: u16 = 0x4000;

    /// The subset of modifier bits legal on a field.
    pub const FIELD_MASK: u16 = Self::ACC_PUBLIC
        | Self::ACC_PRIVATE
        | Self::ACC_PROTECTED
        | Self::ACC_STATIC
        | Self::ACC_FINAL
        | Self::ACC_VOLATILE
        | Self::ACC_TRANSIENT
        | Self::ACC_SYNTHETIC
        | Self::ACC_ENUM;

    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub fn get_raw(self) -> u16 {
        self.0
    }

    pub fn mask_for_fields(self) -> Self {
        Self(self.0 & Self::FIELD_MASK)
    }

    pub fn with_synthetic(self) -> Self {
        Self(self.0 | Self::ACC_SYNTHETIC)
    }

    pub fn is_public(self) -> bool {
        self.0 & Self::ACC_PUBLIC != 0
    }

    pub fn is_private(self) -> bool {
        self.0 & Self::ACC_PRIVATE != 0
    }

    pub fn is_static(self) -> bool {
        self.0 & Self::ACC_STATIC != 0
    }

    pub fn is_final(self) -> bool {
        self.0 & Self::ACC_FINAL != 0
    }

    pub fn is_volatile(self) -> bool {
        self.0 & Self::ACC_VOLATILE != 0
    }

    pub fn is_transient(self) -> bool {
        self.0 & Self::ACC_TRANSIENT != 0
    }

    pub fn is_synthetic(self) -> bool {
        self.0 & Self::ACC_SYNTHETIC != 0
    }

    pub fn is_enum_constant(self) -> bool {
        self.0 & Self::ACC_ENUM != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_drops_non_field_bits() {
        // 0x0020 (ACC_SUPER) and 0x0400 (ACC_ABSTRACT) are not field bits
        let flags = FieldFlags::new(FieldFlags::ACC_STATIC | 0x0020 | 0x0400);
        let masked = flags.mask_for_fields();
        assert!(masked.is_static());
        assert_eq!(masked.get_raw(), FieldFlags::ACC_STATIC);
    }

    #[test]
    fn with_synthetic_is_idempotent() {
        let flags = FieldFlags::new(FieldFlags::ACC_SYNTHETIC).with_synthetic();
        assert!(flags.is_synthetic());
        assert_eq!(flags.get_raw(), FieldFlags::ACC_SYNTHETIC);
    }
}
