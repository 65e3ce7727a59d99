//! The slice of the class-metadata container format this crate consumes: a
//! big-endian cursor over a field's attribute table and the field modifier
//! bit-set. The full container grammar lives with the class loader.

pub mod cursor;
pub mod flags;
