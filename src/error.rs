use crate::classfile::cursor::CursorError;
use crate::keys::{ClassId, Symbol};
use lasso::ThreadedRodeo;
use std::fmt::Display;

#[derive(Debug, PartialEq)]
pub enum VmError {
    Cursor(CursorError),
    /// An unrecognized attribute declared more bytes than the stream held.
    /// Skipping anything other than the declared length would desynchronize
    /// every attribute read that follows, so parsing of the class aborts.
    AttributeLengthMismatch {
        attribute: Symbol,
        declared: usize,
        skipped: usize,
    },
    ConstantIndexOutOfBounds(u16),
    ConstantTypeMismatch {
        index: u16,
        expected: &'static str,
    },
    InvalidTypeDescriptor(String),
    UnsupportedAnnotationTag(u8),
    /// The boot-image metadata registry has no entry for a field the
    /// descriptor claims to declare. A configuration bug, never recoverable.
    HostFieldLookup {
        class: ClassId,
        field: Symbol,
    },
    /// `runtime_final_value` was queried on a field without the pragma.
    NotRuntimeFinal(Symbol),
    OffsetAlreadyAssigned(Symbol),
    OutOfStaticStorage {
        requested: usize,
        capacity: usize,
    },
    OutOfMemory,
    MmapFailed,
}

impl From<CursorError> for VmError {
    fn from(value: CursorError) -> Self {
        VmError::Cursor(value)
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl VmError {
    pub fn into_pretty_string(self, interner: &ThreadedRodeo) -> String {
        match self {
            VmError::AttributeLengthMismatch {
                attribute,
                declared,
                skipped,
            } => format!(
                "Attribute \"{}\" declared {} bytes but only {} could be skipped",
                interner.resolve(&attribute),
                declared,
                skipped
            ),
            VmError::HostFieldLookup { class, field } => format!(
                "No host metadata for field \"{}\" of class #{}",
                interner.resolve(&field),
                class.into_inner()
            ),
            VmError::NotRuntimeFinal(field) => format!(
                "Field \"{}\" carries no runtime-final pragma",
                interner.resolve(&field)
            ),
            _ => format!("{:?}", self),
        }
    }
}
