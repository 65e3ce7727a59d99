use crate::error::VmError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn from_descriptor_char(c: char) -> Option<Self> {
        match c {
            'Z' => Some(PrimitiveType::Boolean),
            'B' => Some(PrimitiveType::Byte),
            'C' => Some(PrimitiveType::Char),
            'S' => Some(PrimitiveType::Short),
            'I' => Some(PrimitiveType::Int),
            'J' => Some(PrimitiveType::Long),
            'F' => Some(PrimitiveType::Float),
            'D' => Some(PrimitiveType::Double),
            _ => None,
        }
    }

    pub fn memory_bytes(self) -> usize {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Byte => 1,
            PrimitiveType::Char | PrimitiveType::Short => 2,
            PrimitiveType::Int | PrimitiveType::Float => 4,
            PrimitiveType::Long | PrimitiveType::Double => 8,
        }
    }

    pub fn stack_slots(self) -> usize {
        match self {
            PrimitiveType::Long | PrimitiveType::Double => 2,
            _ => 1,
        }
    }
}

/// Parsed form of a field type descriptor. Everything the access protocol
/// needs from the type system: width, referenceness, stack slots, kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Primitive(PrimitiveType),
    Instance(Box<str>),
    Array(Box<JavaType>),
}

impl TryFrom<&str> for JavaType {
    type Error = VmError;

    fn try_from(descriptor: &str) -> Result<Self, Self::Error> {
        let invalid = || VmError::InvalidTypeDescriptor(descriptor.to_string());
        let mut chars = descriptor.chars();
        match chars.next().ok_or_else(invalid)? {
            'L' => {
                if !descriptor.ends_with(';') || descriptor.len() < 3 {
                    return Err(invalid());
                }
                Ok(JavaType::Instance(
                    descriptor[1..descriptor.len() - 1].into(),
                ))
            }
            '[' => {
                let element = JavaType::try_from(&descriptor[1..])?;
                Ok(JavaType::Array(Box::new(element)))
            }
            c => {
                if chars.next().is_some() {
                    return Err(invalid());
                }
                PrimitiveType::from_descriptor_char(c)
                    .map(JavaType::Primitive)
                    .ok_or_else(invalid)
            }
        }
    }
}

impl JavaType {
    pub fn is_reference(&self) -> bool {
        matches!(self, JavaType::Instance(_) | JavaType::Array(_))
    }

    /// Bytes of storage a value of this type occupies in an object's layout.
    pub fn memory_bytes(&self) -> usize {
        match self {
            JavaType::Primitive(prim) => prim.memory_bytes(),
            JavaType::Instance(_) | JavaType::Array(_) => size_of::<usize>(),
        }
    }

    /// Width of a value of this type on the evaluation stack.
    pub fn stack_slots(&self) -> usize {
        match self {
            JavaType::Primitive(prim) => prim.stack_slots(),
            JavaType::Instance(_) | JavaType::Array(_) => 1,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            JavaType::Primitive(prim) => Some(*prim),
            _ => None,
        }
    }

    pub fn is_boolean_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Boolean))
    }

    pub fn is_byte_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Byte))
    }

    pub fn is_char_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Char))
    }

    pub fn is_short_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Short))
    }

    pub fn is_int_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Int))
    }

    pub fn is_long_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Long))
    }

    pub fn is_float_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Float))
    }

    pub fn is_double_type(&self) -> bool {
        matches!(self, JavaType::Primitive(PrimitiveType::Double))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitive_descriptors() {
        assert_eq!(
            JavaType::try_from("I").unwrap(),
            JavaType::Primitive(PrimitiveType::Int)
        );
        assert_eq!(JavaType::try_from("J").unwrap().memory_bytes(), 8);
        assert_eq!(JavaType::try_from("Z").unwrap().memory_bytes(), 1);
        assert_eq!(JavaType::try_from("D").unwrap().stack_slots(), 2);
    }

    #[test]
    fn parses_instance_and_array_descriptors() {
        let string = JavaType::try_from("Ljava/lang/String;").unwrap();
        assert!(string.is_reference());
        assert_eq!(string.memory_bytes(), size_of::<usize>());

        let ints = JavaType::try_from("[I").unwrap();
        assert!(ints.is_reference());
        assert_eq!(ints.stack_slots(), 1);
    }

    #[test]
    fn rejects_malformed_descriptors() {
        for desc in ["", "X", "II", "L", "Lfoo", "Ljava/lang/String"] {
            assert!(matches!(
                JavaType::try_from(desc),
                Err(VmError::InvalidTypeDescriptor(_))
            ));
        }
    }
}
