use crate::keys::Symbol;
use lasso::ThreadedRodeo;

/// Interned-once symbols the field layer compares against on every parse:
/// the attribute names it recognizes and the pragma annotation descriptors
/// that drive collector visibility and constant substitution.
pub struct BootstrapRegistry {
    // Attribute names
    pub constant_value_attr_sym: Symbol,
    pub synthetic_attr_sym: Symbol,
    pub signature_attr_sym: Symbol,
    pub runtime_visible_annotations_attr_sym: Symbol,

    // Pragma annotation descriptors (interned)
    pub untraced_pragma_desc: Symbol, // Lsigrun/pragma/Untraced;
    pub runtime_final_pragma_desc: Symbol, // Lsigrun/pragma/RuntimeFinal;

    // Annotation element names
    pub value_sym: Symbol,
}

impl BootstrapRegistry {
    pub fn new(interner: &ThreadedRodeo) -> Self {
        Self {
            constant_value_attr_sym: interner.get_or_intern("ConstantValue"),
            synthetic_attr_sym: interner.get_or_intern("Synthetic"),
            signature_attr_sym: interner.get_or_intern("Signature"),
            runtime_visible_annotations_attr_sym: interner
                .get_or_intern("RuntimeVisibleAnnotations"),
            untraced_pragma_desc: interner.get_or_intern("Lsigrun/pragma/Untraced;"),
            runtime_final_pragma_desc: interner.get_or_intern("Lsigrun/pragma/RuntimeFinal;"),
            value_sym: interner.get_or_intern("value"),
        }
    }
}
