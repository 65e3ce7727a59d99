pub mod annotation;
pub mod constant_pool;
pub mod field;
pub mod jtype;

pub use field::Field;
