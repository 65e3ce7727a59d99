use crate::classfile::cursor::Cursor;
use crate::classfile::flags::FieldFlags;
use crate::debug_log;
use crate::error::VmError;
use crate::heap::{HeapRef, Word};
use crate::keys::{ClassId, FieldId, Symbol};
use crate::mm::AccessContext;
use crate::rt::annotation::{self, Annotation, AnnotationSet, AnnotationValue, MetadataSource};
use crate::rt::constant_pool::ConstantPool;
use crate::rt::jtype::{JavaType, PrimitiveType};
use crate::vm::bootstrap_registry::BootstrapRegistry;
use crate::vm::{Value, VmPhase};
use lasso::ThreadedRodeo;
use once_cell::sync::OnceCell;

/// A declared field of a loaded class: identity, declared type, modifiers,
/// and everything the access protocol needs cached up front. Immutable after
/// construction except for the layout offset, which the object-layout pass
/// assigns exactly once.
#[derive(Debug)]
pub struct Field {
    declaring_class: ClassId,
    id: FieldId,
    name: Symbol,
    desc: Symbol,
    value_type: JavaType,
    flags: FieldFlags,
    signature: Option<Symbol>,
    /// Constant-table index of the field's compile-time constant value.
    /// 0 means the field is not a "static final constant".
    constant_value_index: u16,
    /// Cached from `value_type` at construction, never recomputed.
    size_bytes: u8,
    reference: bool,
    /// Pragma caches; the annotation set is immutable, so these are fixed
    /// for the descriptor's lifetime (the barrier decision depends on it).
    untraced: bool,
    runtime_final: bool,
    annotations: AnnotationSet,
    offset: OnceCell<usize>,
}

impl Field {
    #[allow(clippy::too_many_arguments)]
    fn new(
        declaring_class: ClassId,
        id: FieldId,
        name: Symbol,
        desc: Symbol,
        value_type: JavaType,
        flags: FieldFlags,
        signature: Option<Symbol>,
        constant_value_index: u16,
        annotations: AnnotationSet,
        br: &BootstrapRegistry,
        interner: &ThreadedRodeo,
        phase: VmPhase,
    ) -> Field {
        let untraced = annotations
            .iter()
            .any(|a| a.type_desc == br.untraced_pragma_desc);
        let runtime_final = annotations
            .iter()
            .any(|a| a.type_desc == br.runtime_final_pragma_desc);
        if untraced && phase.is_live() {
            // The collector has already built its view of the world; a field
            // it cannot see appearing now breaks tracing soundness.
            panic!(
                "Untraced field \"{}\" of class #{} created while the runtime is live",
                interner.resolve(&name),
                declaring_class.into_inner()
            );
        }
        Field {
            declaring_class,
            id,
            name,
            desc,
            size_bytes: value_type.memory_bytes() as u8,
            reference: value_type.is_reference(),
            value_type,
            flags,
            signature,
            constant_value_index,
            untraced,
            runtime_final,
            annotations,
            offset: OnceCell::new(),
        }
    }

    /// Reads one field's attribute table and builds its descriptor. The
    /// cursor must be positioned at the attribute count; on success it ends
    /// right after the last attribute, on failure the enclosing class parse
    /// must abort (the stream position is no longer trustworthy).
    #[allow(clippy::too_many_arguments)]
    #[hotpath::measure]
    pub fn read(
        declaring_class: ClassId,
        id: FieldId,
        name: Symbol,
        desc: Symbol,
        mut flags: FieldFlags,
        cp: &ConstantPool,
        cursor: &mut Cursor<'_>,
        br: &BootstrapRegistry,
        interner: &ThreadedRodeo,
        phase: VmPhase,
    ) -> Result<Field, VmError> {
        let value_type = JavaType::try_from(interner.resolve(&desc))?;

        let mut constant_value_index = 0u16;
        let mut signature = None;
        let mut annotations = AnnotationSet::new();

        let attr_count = cursor.read_u16()?;
        for _ in 0..attr_count {
            let attr_name = cp.get_utf8_sym(cursor.read_u16()?)?;
            let attr_length = cursor.read_i32()?;
            if attr_name == br.constant_value_attr_sym {
                constant_value_index = cursor.read_u16()?;
            } else if attr_name == br.synthetic_attr_sym {
                flags = flags.with_synthetic();
            } else if attr_name == br.signature_attr_sym {
                signature = Some(cp.get_utf8_sym(cursor.read_u16()?)?);
            } else if attr_name == br.runtime_visible_annotations_attr_sym {
                annotations = annotation::read_annotations(cp, cursor)?;
            } else {
                // all other attributes are boring, but they must be skipped
                // by exactly their declared length
                let declared = attr_length as usize;
                let skipped = cursor.skip(declared);
                if skipped != declared {
                    return Err(VmError::AttributeLengthMismatch {
                        attribute: attr_name,
                        declared,
                        skipped,
                    });
                }
            }
        }

        debug_log!(
            "Parsed field \"{}\" of class #{} ({} attributes)",
            interner.resolve(&name),
            declaring_class.into_inner(),
            attr_count
        );

        Ok(Self::new(
            declaring_class,
            id,
            name,
            desc,
            value_type,
            flags.mask_for_fields(),
            signature,
            constant_value_index,
            annotations,
            br,
            interner,
            phase,
        ))
    }

    /// Builds a descriptor for a compiler-generated field that never existed
    /// in source form (annotation-implementation classes). Takes the modifier
    /// value as given, carries no annotations and no constant value.
    pub fn synthetic(
        declaring_class: ClassId,
        id: FieldId,
        name: Symbol,
        desc: Symbol,
        flags: FieldFlags,
        br: &BootstrapRegistry,
        interner: &ThreadedRodeo,
        phase: VmPhase,
    ) -> Result<Field, VmError> {
        let value_type = JavaType::try_from(interner.resolve(&desc))?;
        Ok(Self::new(
            declaring_class,
            id,
            name,
            desc,
            value_type,
            flags,
            None,
            0,
            AnnotationSet::new(),
            br,
            interner,
            phase,
        ))
    }

    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    /// Stable identifier the collector uses for barrier instrumentation.
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn type_descriptor(&self) -> Symbol {
        self.desc
    }

    pub fn value_type(&self) -> &JavaType {
        &self.value_type
    }

    pub fn modifiers(&self) -> FieldFlags {
        self.flags
    }

    pub fn signature(&self) -> Option<Symbol> {
        self.signature
    }

    pub fn constant_value_index(&self) -> u16 {
        self.constant_value_index
    }

    /// How many bytes of storage a value of this field takes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes as usize
    }

    /// Does the field hold a managed reference?
    pub fn is_reference_type(&self) -> bool {
        self.reference
    }

    /// Width of this field's value on the evaluation stack, derived from the
    /// type on demand.
    pub fn number_of_stack_slots(&self) -> usize {
        self.value_type.stack_slots()
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.flags.is_final()
    }

    /// Value not to be cached in a register; ordering is the code
    /// generator's job, this layer only reports the bit.
    pub fn is_volatile(&self) -> bool {
        self.flags.is_volatile()
    }

    pub fn is_transient(&self) -> bool {
        self.flags.is_transient()
    }

    pub fn is_synthetic(&self) -> bool {
        self.flags.is_synthetic()
    }

    pub fn is_enum_constant(&self) -> bool {
        self.flags.is_enum_constant()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Is this field invisible to the memory management system?
    pub fn is_untraced(&self) -> bool {
        self.untraced
    }

    /// May the annotation's literal value be used in place of reading the
    /// field?
    pub fn is_runtime_final(&self) -> bool {
        self.runtime_final
    }

    /// The literal carried by the runtime-final pragma. Only valid when
    /// [`Field::is_runtime_final`] holds. While the runtime is live the
    /// descriptor's own annotation set answers; at boot-image build time the
    /// hosting environment's registry does, and a missing entry there is a
    /// configuration bug surfaced as [`VmError::HostFieldLookup`].
    pub fn runtime_final_value(
        &self,
        source: &MetadataSource<'_>,
        br: &BootstrapRegistry,
    ) -> Result<AnnotationValue, VmError> {
        let pick = |set: &[Annotation]| {
            set.iter()
                .find(|a| a.type_desc == br.runtime_final_pragma_desc)
                .and_then(|a| a.element(br.value_sym))
        };
        match source {
            MetadataSource::Runtime => {
                pick(&self.annotations).ok_or(VmError::NotRuntimeFinal(self.name))
            }
            MetadataSource::Host(host) => {
                let annotations = host
                    .field_annotations(self.declaring_class, self.name)
                    .ok_or(VmError::HostFieldLookup {
                        class: self.declaring_class,
                        field: self.name,
                    })?;
                pick(&annotations).ok_or(VmError::NotRuntimeFinal(self.name))
            }
        }
    }

    /// Assigns the field's storage offset, computed by the object-layout
    /// pass (instance fields) or [`crate::heap::statics::Statics::reserve`]
    /// (static fields).
    pub fn set_offset(&self, offset: usize) -> Result<(), VmError> {
        self.offset
            .set(offset)
            .map_err(|_| VmError::OffsetAlreadyAssigned(self.name))
    }

    pub fn offset(&self) -> usize {
        self.offset
            .get()
            .copied()
            .expect("field offset assigned before first access")
    }
}

// ------------------------------------------------------------------- //
// Low level support for various reflective operations. Because        //
// different clients have different error checking requirements, these //
// operations are completely unchecked: the caller has already proven  //
// that `obj` is a live object of a class assignable to the declaring  //
// class and that the offset was assigned by the layout pass.          //
// ------------------------------------------------------------------- //

/// # Safety
/// For every accessor below: the field's offset must be assigned; for
/// instance fields `obj` must be a live object of an assignable class (it is
/// ignored for static fields); the accessed width must match the field's
/// declared type; volatile ordering, if required, is fenced by the caller.
impl Field {
    /// Reads a reference field, GC safe: routed through the memory manager's
    /// read barrier whenever the configuration asks for one and the field is
    /// traced.
    pub unsafe fn get_object_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> HeapRef {
        if self.is_static() {
            if ctx.barriers.static_read && !self.untraced {
                unsafe { ctx.mm.static_read_barrier(ctx.statics, self.offset(), self.id) }
            } else {
                unsafe { ctx.statics.get_slot_ref(self.offset()) }
            }
        } else if ctx.barriers.instance_read && !self.untraced {
            unsafe { ctx.mm.instance_read_barrier(ctx.heap, obj, self.offset(), self.id) }
        } else {
            unsafe { ctx.heap.get_ref_at(obj, self.offset()) }
        }
    }

    /// Writes a reference field, GC safe: the single most safety-relevant
    /// branch in this crate. A missed write barrier here corrupts collector
    /// invariants far from the call site.
    pub unsafe fn set_object_unchecked(
        &self,
        ctx: &AccessContext<'_>,
        obj: HeapRef,
        value: HeapRef,
    ) {
        if self.is_static() {
            if ctx.barriers.static_write && !self.untraced {
                unsafe {
                    ctx.mm
                        .static_write_barrier(ctx.statics, self.offset(), value, self.id)
                }
            } else {
                unsafe { ctx.statics.set_slot_ref(self.offset(), value) }
            }
        } else if ctx.barriers.instance_write && !self.untraced {
            unsafe {
                ctx.mm
                    .instance_write_barrier(ctx.heap, obj, self.offset(), value, self.id)
            }
        } else {
            unsafe { ctx.heap.set_ref_at(obj, self.offset(), value) }
        }
    }

    /// Reads the field's contents as an address-sized opaque value. Never
    /// takes the barrier branch, even for reference fields; only callers
    /// that know the collector cannot move underneath them may use this.
    pub unsafe fn get_word_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> Word {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_word(self.offset()) }
        } else {
            unsafe { ctx.heap.get_word_at(obj, self.offset()) }
        }
    }

    /// Raw counterpart of [`Field::set_object_unchecked`]; same caveat as
    /// [`Field::get_word_unchecked`].
    pub unsafe fn set_word_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: Word) {
        if self.is_static() {
            unsafe { ctx.statics.set_slot_word(self.offset(), value) }
        } else {
            unsafe { ctx.heap.set_word_at(obj, self.offset(), value) }
        }
    }

    pub unsafe fn get_boolean_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> bool {
        let bits = if self.is_static() {
            unsafe { ctx.statics.get_slot_i32(self.offset()) as u8 }
        } else {
            unsafe { ctx.heap.get_unsigned_byte_at(obj, self.offset()) }
        };
        bits != 0
    }

    pub unsafe fn set_boolean_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: bool) {
        if self.is_static() {
            unsafe { ctx.statics.set_slot_i32(self.offset(), value as i32) }
        } else {
            unsafe {
                ctx.heap
                    .set_unsigned_byte_at(obj, self.offset(), value as u8)
            }
        }
    }

    pub unsafe fn get_byte_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i8 {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_i32(self.offset()) as i8 }
        } else {
            unsafe { ctx.heap.get_byte_at(obj, self.offset()) }
        }
    }

    pub unsafe fn set_byte_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i8) {
        if self.is_static() {
            // the slot table is word-granular: sign-extend to a full slot
            unsafe { ctx.statics.set_slot_i32(self.offset(), value as i32) }
        } else {
            unsafe { ctx.heap.set_byte_at(obj, self.offset(), value) }
        }
    }

    pub unsafe fn get_char_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> u16 {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_i32(self.offset()) as u16 }
        } else {
            unsafe { ctx.heap.get_char_at(obj, self.offset()) }
        }
    }

    pub unsafe fn set_char_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: u16) {
        if self.is_static() {
            // zero-extended: char is the one unsigned integral kind
            unsafe { ctx.statics.set_slot_i32(self.offset(), value as i32) }
        } else {
            unsafe { ctx.heap.set_char_at(obj, self.offset(), value) }
        }
    }

    pub unsafe fn get_short_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i16 {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_i32(self.offset()) as i16 }
        } else {
            unsafe { ctx.heap.get_short_at(obj, self.offset()) }
        }
    }

    pub unsafe fn set_short_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i16) {
        if self.is_static() {
            unsafe { ctx.statics.set_slot_i32(self.offset(), value as i32) }
        } else {
            unsafe { ctx.heap.set_short_at(obj, self.offset(), value) }
        }
    }

    pub unsafe fn get_int_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i32 {
        unsafe { self.get_32_bits(ctx, obj) }
    }

    pub unsafe fn set_int_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i32) {
        unsafe { self.put_32_bits(ctx, obj, value) }
    }

    pub unsafe fn get_long_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i64 {
        unsafe { self.get_64_bits(ctx, obj) }
    }

    pub unsafe fn set_long_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i64) {
        unsafe { self.put_64_bits(ctx, obj, value) }
    }

    /// Floating-point values move through equal-width integer loads/stores
    /// as bit patterns, never through numeric conversion: NaN payloads and
    /// signed zero survive storage exactly.
    pub unsafe fn get_float_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> f32 {
        f32::from_bits(unsafe { self.get_32_bits(ctx, obj) } as u32)
    }

    pub unsafe fn set_float_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: f32) {
        unsafe { self.put_32_bits(ctx, obj, value.to_bits() as i32) }
    }

    pub unsafe fn get_double_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> f64 {
        f64::from_bits(unsafe { self.get_64_bits(ctx, obj) } as u64)
    }

    pub unsafe fn set_double_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: f64) {
        unsafe { self.put_64_bits(ctx, obj, value.to_bits() as i64) }
    }

    /// Reads the field boxed as a [`Value`] per its declared type: the
    /// direct reference for reference fields, the widened primitive
    /// otherwise. Every declarable field type maps to exactly one getter.
    pub unsafe fn get_value_unchecked(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> Value {
        let kind = match &self.value_type {
            JavaType::Instance(_) | JavaType::Array(_) => {
                return match unsafe { self.get_object_unchecked(ctx, obj) } {
                    0 => Value::Null,
                    heap_ref => Value::Ref(heap_ref),
                };
            }
            JavaType::Primitive(kind) => *kind,
        };
        match kind {
            PrimitiveType::Boolean => {
                Value::Integer(unsafe { self.get_boolean_unchecked(ctx, obj) } as i32)
            }
            PrimitiveType::Byte => {
                Value::Integer(unsafe { self.get_byte_unchecked(ctx, obj) } as i32)
            }
            PrimitiveType::Char => {
                Value::Integer(unsafe { self.get_char_unchecked(ctx, obj) } as i32)
            }
            PrimitiveType::Short => {
                Value::Integer(unsafe { self.get_short_unchecked(ctx, obj) } as i32)
            }
            PrimitiveType::Int => Value::Integer(unsafe { self.get_int_unchecked(ctx, obj) }),
            PrimitiveType::Long => Value::Long(unsafe { self.get_long_unchecked(ctx, obj) }),
            PrimitiveType::Float => Value::Float(unsafe { self.get_float_unchecked(ctx, obj) }),
            PrimitiveType::Double => Value::Double(unsafe { self.get_double_unchecked(ctx, obj) }),
        }
    }

    unsafe fn get_32_bits(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i32 {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_i32(self.offset()) }
        } else {
            unsafe { ctx.heap.get_int_at(obj, self.offset()) }
        }
    }

    unsafe fn put_32_bits(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i32) {
        if self.is_static() {
            unsafe { ctx.statics.set_slot_i32(self.offset(), value) }
        } else {
            unsafe { ctx.heap.set_int_at(obj, self.offset(), value) }
        }
    }

    unsafe fn get_64_bits(&self, ctx: &AccessContext<'_>, obj: HeapRef) -> i64 {
        if self.is_static() {
            unsafe { ctx.statics.get_slot_i64(self.offset()) }
        } else {
            unsafe { ctx.heap.get_long_at(obj, self.offset()) }
        }
    }

    unsafe fn put_64_bits(&self, ctx: &AccessContext<'_>, obj: HeapRef, value: i64) {
        if self.is_static() {
            unsafe { ctx.statics.set_slot_i64(self.offset(), value) }
        } else {
            unsafe { ctx.heap.set_long_at(obj, self.offset(), value) }
        }
    }
}
