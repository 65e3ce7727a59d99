use crate::classfile::cursor::Cursor;
use crate::error::VmError;
use crate::keys::{ClassId, Symbol};
use crate::rt::constant_pool::ConstantPool;
use dashmap::DashMap;
use num_enum::TryFromPrimitive;
use smallvec::SmallVec;

/// Literal carried by one annotation element. Field pragmas only ever use
/// constant-valued elements; nested annotations, arrays and class literals
/// belong to the full annotation layer, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Str(Symbol),
}

/// One runtime-visible annotation attached to a field descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_desc: Symbol,
    pub elements: SmallVec<[(Symbol, AnnotationValue); 2]>,
}

impl Annotation {
    pub fn element(&self, name: Symbol) -> Option<AnnotationValue> {
        self.elements
            .iter()
            .find(|(element_name, _)| *element_name == name)
            .map(|(_, value)| *value)
    }
}

pub type AnnotationSet = SmallVec<[Annotation; 2]>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
enum ElementTag {
    Byte = b'B',
    Char = b'C',
    Double = b'D',
    Float = b'F',
    Int = b'I',
    Long = b'J',
    Short = b'S',
    Boolean = b'Z',
    String = b's',
}

fn read_element_value(cp: &ConstantPool, cursor: &mut Cursor<'_>) -> Result<AnnotationValue, VmError> {
    let tag = cursor.read_u8()?;
    let tag = ElementTag::try_from(tag).map_err(|_| VmError::UnsupportedAnnotationTag(tag))?;
    let const_index = cursor.read_u16()?;
    let value = match tag {
        ElementTag::Byte | ElementTag::Char | ElementTag::Short | ElementTag::Int => {
            AnnotationValue::Int(cp.get_integer(const_index)?)
        }
        ElementTag::Boolean => AnnotationValue::Boolean(cp.get_integer(const_index)? != 0),
        ElementTag::Long => AnnotationValue::Long(cp.get_long(const_index)?),
        ElementTag::Float => AnnotationValue::Float(cp.get_float(const_index)?),
        ElementTag::Double => AnnotationValue::Double(cp.get_double(const_index)?),
        ElementTag::String => AnnotationValue::Str(cp.get_utf8_sym(const_index)?),
    };
    Ok(value)
}

/// Reads the body of a RuntimeVisibleAnnotations attribute positioned right
/// after its length word.
pub fn read_annotations(
    cp: &ConstantPool,
    cursor: &mut Cursor<'_>,
) -> Result<AnnotationSet, VmError> {
    let count = cursor.read_u16()?;
    let mut annotations = AnnotationSet::new();
    for _ in 0..count {
        let type_desc = cp.get_utf8_sym(cursor.read_u16()?)?;
        let pair_count = cursor.read_u16()?;
        let mut elements = SmallVec::new();
        for _ in 0..pair_count {
            let name = cp.get_utf8_sym(cursor.read_u16()?)?;
            elements.push((name, read_element_value(cp, cursor)?));
        }
        annotations.push(Annotation {
            type_desc,
            elements,
        });
    }
    Ok(annotations)
}

/// Field annotations as seen by the hosting environment while the boot image
/// is being written, before the runtime is self-hosting. The image writer
/// registers every pragma-bearing field here; descriptors fall back to this
/// table when queried in `VmPhase::BootImage`.
#[derive(Default)]
pub struct HostAnnotations {
    fields: DashMap<(ClassId, Symbol), AnnotationSet>,
}

impl HostAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_field(&self, class: ClassId, field: Symbol, annotations: AnnotationSet) {
        self.fields.insert((class, field), annotations);
    }

    pub fn field_annotations(&self, class: ClassId, field: Symbol) -> Option<AnnotationSet> {
        self.fields.get(&(class, field)).map(|entry| entry.clone())
    }
}

/// Where annotation-derived queries resolve their data, selected by runtime
/// phase: the descriptor's own table once the runtime is live, the hosting
/// environment's registry while the boot image is being built.
pub enum MetadataSource<'a> {
    Runtime,
    Host(&'a HostAnnotations),
}
