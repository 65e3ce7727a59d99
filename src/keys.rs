use std::num::NonZeroU32;

pub type Symbol = lasso::Spur;

macro_rules! id_key {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn new(inner: NonZeroU32) -> Self {
                Self(inner)
            }

            /// 1-based: built from `len()` of the owning table after a push.
            pub fn from_usize(value: usize) -> Self {
                Self(NonZeroU32::new(value as u32).expect("id must be non-zero"))
            }

            pub fn to_index(self) -> usize {
                (self.0.get() - 1) as usize
            }

            pub fn into_inner(self) -> NonZeroU32 {
                self.0
            }
        }
    };
}

id_key!(ClassId);
id_key!(FieldId);
