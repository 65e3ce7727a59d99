//! Field metadata and barrier-aware field access for the sigrun runtime.
//!
//! This crate owns the boundary between class metadata (what a field is) and
//! raw memory (where its value lives). Descriptors are parsed once at class
//! loading time, then the unchecked access protocol reads and writes field
//! values through the shared static-value table or an object's instance
//! storage, routing reference loads/stores through the memory manager's
//! barriers when the collector configuration requires it.

pub mod classfile;
pub mod error;
pub mod heap;
pub mod keys;
pub mod mm;
pub mod rt;
pub mod vm;

pub use keys::{ClassId, FieldId, Symbol};

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log-runtime-traces")]
        tracing_log::log::debug!($($arg)*);
    }};
}

#[macro_export]
macro_rules! debug_error_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log-runtime-traces")]
        tracing_log::log::error!($($arg)*);
    }};
}
