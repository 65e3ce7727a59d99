use crate::heap::HeapRef;

pub mod bootstrap_registry;

/// Used to represent a field's contents boxed behind one type, the way the
/// reflection layer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Ref(HeapRef),
    Null,
}

impl Value {
    pub fn as_nullable_obj_ref(&self) -> Option<HeapRef> {
        match self {
            Value::Ref(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }
}

/// Where in its lifecycle the runtime is. Untraced fields may only come into
/// existence before the runtime is live, and annotation queries pick their
/// lookup path based on this. Threaded explicitly through construction and
/// metadata calls instead of living in an ambient global.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VmPhase {
    /// Boot-image build: the runtime does not execute yet, metadata lives on
    /// the hosting environment's side.
    BootImage,
    /// The runtime executes; descriptors are the source of truth.
    Live,
}

impl VmPhase {
    pub fn is_live(self) -> bool {
        matches!(self, VmPhase::Live)
    }
}
