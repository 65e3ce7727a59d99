use crate::error::VmError;
use crate::keys::Symbol;

/// The subset of constant kinds field metadata can reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    /// Index 0 and the phantom slot after a Long/Double entry.
    Unused,
    Utf8(Symbol),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Symbol),
}

/// Constant/symbol table of one class. Entries are 1-based, as in the
/// serialized container format; index 0 is always `Unused`.
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub fn new(mut entries: Vec<Constant>) -> Self {
        entries.insert(0, Constant::Unused);
        Self { entries }
    }

    fn get(&self, index: u16) -> Result<&Constant, VmError> {
        self.entries
            .get(index as usize)
            .ok_or(VmError::ConstantIndexOutOfBounds(index))
    }

    pub fn get_utf8_sym(&self, index: u16) -> Result<Symbol, VmError> {
        match self.get(index)? {
            Constant::Utf8(sym) => Ok(*sym),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub fn get_integer(&self, index: u16) -> Result<i32, VmError> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "Integer",
            }),
        }
    }

    pub fn get_long(&self, index: u16) -> Result<i64, VmError> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "Long",
            }),
        }
    }

    pub fn get_float(&self, index: u16) -> Result<f32, VmError> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "Float",
            }),
        }
    }

    pub fn get_double(&self, index: u16) -> Result<f64, VmError> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "Double",
            }),
        }
    }

    pub fn get_string_sym(&self, index: u16) -> Result<Symbol, VmError> {
        match self.get(index)? {
            Constant::String(sym) => Ok(*sym),
            _ => Err(VmError::ConstantTypeMismatch {
                index,
                expected: "String",
            }),
        }
    }
}
