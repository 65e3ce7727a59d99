//! End-to-end coverage of the unchecked field access protocol: storage
//! selection, value widening in the shared slot table, bit-exact floating
//! point transfer and barrier routing for reference fields.

use std::sync::Mutex;

use lasso::ThreadedRodeo;
use rstest::rstest;
use sigrun_runtime::classfile::cursor::Cursor;
use sigrun_runtime::classfile::flags::FieldFlags;
use sigrun_runtime::heap::statics::Statics;
use sigrun_runtime::heap::{Heap, HeapRef};
use sigrun_runtime::mm::{AccessContext, BarrierSet, MemoryManager, PassthroughBarriers};
use sigrun_runtime::rt::Field;
use sigrun_runtime::rt::constant_pool::{Constant, ConstantPool};
use sigrun_runtime::vm::bootstrap_registry::BootstrapRegistry;
use sigrun_runtime::vm::{Value, VmPhase};
use sigrun_runtime::{ClassId, FieldId};

struct Harness {
    interner: ThreadedRodeo,
    statics: Statics,
    heap: Heap,
    next_field: usize,
}

impl Harness {
    fn new() -> Self {
        Harness {
            interner: ThreadedRodeo::default(),
            statics: Statics::new(16).unwrap(),
            heap: Heap::new(1).unwrap(),
            next_field: 1,
        }
    }

    fn br(&self) -> BootstrapRegistry {
        BootstrapRegistry::new(&self.interner)
    }

    fn field(&mut self, name: &str, desc: &str, flags: u16) -> Field {
        let id = self.next_field;
        self.next_field += 1;
        Field::synthetic(
            ClassId::from_usize(1),
            FieldId::from_usize(id),
            self.interner.get_or_intern(name),
            self.interner.get_or_intern(desc),
            FieldFlags::new(flags),
            &self.br(),
            &self.interner,
            VmPhase::Live,
        )
        .unwrap()
    }

    fn static_field(&mut self, name: &str, desc: &str) -> Field {
        let field = self.field(name, desc, FieldFlags::ACC_STATIC);
        let slot = self.statics.reserve(field.size_bytes()).unwrap();
        field.set_offset(slot).unwrap();
        field
    }

    fn instance_field(&mut self, name: &str, desc: &str, offset: usize) -> Field {
        let field = self.field(name, desc, 0);
        field.set_offset(offset).unwrap();
        field
    }

    fn alloc(&mut self, size: usize) -> HeapRef {
        self.heap.alloc_instance(size, ClassId::from_usize(1)).unwrap()
    }

    fn ctx<'a>(&'a self, barriers: BarrierSet, mm: &'a dyn MemoryManager) -> AccessContext<'a> {
        AccessContext {
            statics: &self.statics,
            heap: &self.heap,
            barriers,
            mm,
        }
    }

    /// A parsed static reference field carrying the collector-invisibility
    /// pragma; the synthetic factory cannot produce one because it attaches
    /// no annotations.
    fn untraced_static_ref_field(&mut self, name: &str) -> Field {
        let pragma = self.interner.get_or_intern("Lsigrun/pragma/Untraced;");
        let attr_name = self
            .interner
            .get_or_intern("RuntimeVisibleAnnotations");
        let cp = ConstantPool::new(vec![Constant::Utf8(attr_name), Constant::Utf8(pragma)]);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_be_bytes()); // attribute count
        bytes.extend_from_slice(&1u16.to_be_bytes()); // attribute name index
        bytes.extend_from_slice(&6i32.to_be_bytes()); // attribute length
        bytes.extend_from_slice(&1u16.to_be_bytes()); // num_annotations
        bytes.extend_from_slice(&2u16.to_be_bytes()); // type index
        bytes.extend_from_slice(&0u16.to_be_bytes()); // no element pairs

        let id = self.next_field;
        self.next_field += 1;
        let mut cursor = Cursor::new(&bytes);
        let field = Field::read(
            ClassId::from_usize(1),
            FieldId::from_usize(id),
            self.interner.get_or_intern(name),
            self.interner.get_or_intern("Ljava/lang/Object;"),
            FieldFlags::new(FieldFlags::ACC_STATIC),
            &cp,
            &mut cursor,
            &self.br(),
            &self.interner,
            VmPhase::BootImage,
        )
        .unwrap();
        let slot = self.statics.reserve(field.size_bytes()).unwrap();
        field.set_offset(slot).unwrap();
        field
    }
}

#[derive(Debug, PartialEq)]
enum BarrierEvent {
    StaticRead { offset: usize },
    StaticWrite { offset: usize, value: HeapRef },
    InstanceRead { obj: HeapRef, offset: usize },
    InstanceWrite { obj: HeapRef, offset: usize, value: HeapRef },
}

/// Records every barrier invocation and deliberately performs no memory
/// access, so a test can tell a barriered access from a direct one by
/// looking at the underlying slot afterwards.
#[derive(Default)]
struct RecordingMm {
    events: Mutex<Vec<BarrierEvent>>,
    read_result: HeapRef,
}

impl RecordingMm {
    fn returning(read_result: HeapRef) -> Self {
        RecordingMm {
            events: Mutex::new(Vec::new()),
            read_result,
        }
    }

    fn events(&self) -> Vec<BarrierEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl MemoryManager for RecordingMm {
    unsafe fn static_read_barrier(
        &self,
        _statics: &Statics,
        offset: usize,
        _field: FieldId,
    ) -> HeapRef {
        self.events
            .lock()
            .unwrap()
            .push(BarrierEvent::StaticRead { offset });
        self.read_result
    }

    unsafe fn static_write_barrier(
        &self,
        _statics: &Statics,
        offset: usize,
        value: HeapRef,
        _field: FieldId,
    ) {
        self.events
            .lock()
            .unwrap()
            .push(BarrierEvent::StaticWrite { offset, value });
    }

    unsafe fn instance_read_barrier(
        &self,
        _heap: &Heap,
        obj: HeapRef,
        offset: usize,
        _field: FieldId,
    ) -> HeapRef {
        self.events
            .lock()
            .unwrap()
            .push(BarrierEvent::InstanceRead { obj, offset });
        self.read_result
    }

    unsafe fn instance_write_barrier(
        &self,
        _heap: &Heap,
        obj: HeapRef,
        offset: usize,
        value: HeapRef,
        _field: FieldId,
    ) {
        self.events
            .lock()
            .unwrap()
            .push(BarrierEvent::InstanceWrite { obj, offset, value });
    }
}

// ---------------------------------------------------------------------
// Round trips through both storages
// ---------------------------------------------------------------------

#[rstest]
#[case(i32::MIN)]
#[case(-1)]
#[case(0)]
#[case(i32::MAX)]
fn static_int_round_trip(#[case] value: i32) {
    let mut h = Harness::new();
    let field = h.static_field("counter", "I");
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);
    unsafe {
        field.set_int_unchecked(&ctx, 0, value);
        assert_eq!(field.get_int_unchecked(&ctx, 0), value);
    }
}

#[rstest]
#[case(i64::MIN)]
#[case(-1)]
#[case(i64::MAX)]
fn static_long_round_trip(#[case] value: i64) {
    let mut h = Harness::new();
    let field = h.static_field("epoch", "J");
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);
    unsafe {
        field.set_long_unchecked(&ctx, 0, value);
        assert_eq!(field.get_long_unchecked(&ctx, 0), value);
    }
}

#[test]
fn instance_fields_round_trip_all_integral_kinds() {
    let mut h = Harness::new();
    let obj = h.alloc(64);
    let flag = h.instance_field("flag", "Z", 0);
    let tiny = h.instance_field("tiny", "B", 1);
    let glyph = h.instance_field("glyph", "C", 2);
    let small = h.instance_field("small", "S", 4);
    let count = h.instance_field("count", "I", 8);
    let ticks = h.instance_field("ticks", "J", 16);
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);

    unsafe {
        flag.set_boolean_unchecked(&ctx, obj, true);
        tiny.set_byte_unchecked(&ctx, obj, i8::MIN);
        glyph.set_char_unchecked(&ctx, obj, 0xFFFF);
        small.set_short_unchecked(&ctx, obj, i16::MIN);
        count.set_int_unchecked(&ctx, obj, -7);
        ticks.set_long_unchecked(&ctx, obj, i64::MIN);

        assert!(flag.get_boolean_unchecked(&ctx, obj));
        assert_eq!(tiny.get_byte_unchecked(&ctx, obj), i8::MIN);
        assert_eq!(glyph.get_char_unchecked(&ctx, obj), 0xFFFF);
        assert_eq!(small.get_short_unchecked(&ctx, obj), i16::MIN);
        assert_eq!(count.get_int_unchecked(&ctx, obj), -7);
        assert_eq!(ticks.get_long_unchecked(&ctx, obj), i64::MIN);
    }
}

#[test]
fn narrow_statics_widen_with_correct_extension() {
    let mut h = Harness::new();
    let tiny = h.static_field("tiny", "B");
    let glyph = h.static_field("glyph", "C");
    let small = h.static_field("small", "S");
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);

    unsafe {
        tiny.set_byte_unchecked(&ctx, 0, -128);
        glyph.set_char_unchecked(&ctx, 0, 0xFFFF);
        small.set_short_unchecked(&ctx, 0, -2);

        // byte/short sign-extend into the slot, char zero-extends
        assert_eq!(ctx.statics.get_slot_i32(tiny.offset()), -128);
        assert_eq!(ctx.statics.get_slot_i32(glyph.offset()), 0xFFFF);
        assert_eq!(ctx.statics.get_slot_i32(small.offset()), -2);

        assert_eq!(tiny.get_byte_unchecked(&ctx, 0), -128);
        assert_eq!(glyph.get_char_unchecked(&ctx, 0), 0xFFFF);
        assert_eq!(small.get_short_unchecked(&ctx, 0), -2);
    }
}

#[rstest]
#[case(0x7FC0_1234u32)] // NaN with a payload
#[case((-0.0f32).to_bits())]
#[case(f32::MIN_POSITIVE.to_bits())]
fn float_transfer_is_bit_exact(#[case] bits: u32) {
    let mut h = Harness::new();
    let obj = h.alloc(16);
    let field = h.instance_field("ratio", "F", 0);
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);
    unsafe {
        field.set_float_unchecked(&ctx, obj, f32::from_bits(bits));
        assert_eq!(field.get_float_unchecked(&ctx, obj).to_bits(), bits);
    }
}

#[rstest]
#[case(0x7FF8_0000_0000_BEEFu64)] // NaN with a payload
#[case((-0.0f64).to_bits())]
fn double_transfer_is_bit_exact(#[case] bits: u64) {
    let mut h = Harness::new();
    let field = h.static_field("scale", "D");
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);
    unsafe {
        field.set_double_unchecked(&ctx, 0, f64::from_bits(bits));
        assert_eq!(field.get_double_unchecked(&ctx, 0).to_bits(), bits);
    }
}

// ---------------------------------------------------------------------
// Barrier routing
// ---------------------------------------------------------------------

#[test]
fn reference_writes_route_through_the_write_barrier() {
    let mut h = Harness::new();
    let obj = h.alloc(32);
    let target = h.alloc(8);
    let field = h.instance_field("next", "Ljava/lang/Object;", 0);
    let mm = RecordingMm::default();
    let ctx = h.ctx(BarrierSet::ALL, &mm);

    unsafe {
        field.set_object_unchecked(&ctx, obj, target);
        // the barrier owned the store; nothing reached the slot directly
        assert_eq!(ctx.heap.get_ref_at(obj, 0), 0);
    }
    assert_eq!(
        mm.events(),
        vec![BarrierEvent::InstanceWrite {
            obj,
            offset: 0,
            value: target,
        }]
    );
}

#[test]
fn reference_reads_route_through_the_read_barrier() {
    let mut h = Harness::new();
    let obj = h.alloc(32);
    let forwarded = 0xD0 as HeapRef;
    let field = h.instance_field("next", "Ljava/lang/Object;", 8);
    let mm = RecordingMm::returning(forwarded);
    let ctx = h.ctx(BarrierSet::ALL, &mm);

    let seen = unsafe { field.get_object_unchecked(&ctx, obj) };
    assert_eq!(seen, forwarded);
    assert_eq!(mm.events(), vec![BarrierEvent::InstanceRead { obj, offset: 8 }]);
}

#[test]
fn static_reference_barriers_target_the_slot_table() {
    let mut h = Harness::new();
    let target = h.alloc(8);
    let field = h.static_field("root", "Ljava/lang/Object;");
    let mm = RecordingMm::default();
    let ctx = h.ctx(BarrierSet::ALL, &mm);

    unsafe {
        field.set_object_unchecked(&ctx, 0, target);
        assert_eq!(ctx.statics.get_slot_ref(field.offset()), 0);
        let _ = field.get_object_unchecked(&ctx, 0);
    }
    assert_eq!(
        mm.events(),
        vec![
            BarrierEvent::StaticWrite {
                offset: field.offset(),
                value: target,
            },
            BarrierEvent::StaticRead {
                offset: field.offset(),
            },
        ]
    );
}

#[test]
fn disabled_barriers_store_directly() {
    let mut h = Harness::new();
    let obj = h.alloc(32);
    let target = h.alloc(8);
    let field = h.instance_field("next", "Ljava/lang/Object;", 0);
    let mm = RecordingMm::default();
    let ctx = h.ctx(BarrierSet::NONE, &mm);

    unsafe {
        field.set_object_unchecked(&ctx, obj, target);
        assert_eq!(field.get_object_unchecked(&ctx, obj), target);
        assert_eq!(ctx.heap.get_ref_at(obj, 0), target);
    }
    assert!(mm.events().is_empty());
}

#[test]
fn untraced_reference_fields_never_take_the_barrier() {
    let mut h = Harness::new();
    let target = h.alloc(8);
    let field = h.untraced_static_ref_field("bootRoot");
    assert!(field.is_untraced());

    let mm = RecordingMm::default();
    let ctx = h.ctx(BarrierSet::ALL, &mm);
    unsafe {
        field.set_object_unchecked(&ctx, 0, target);
        assert_eq!(field.get_object_unchecked(&ctx, 0), target);
    }
    assert!(mm.events().is_empty());
}

#[test]
fn word_access_bypasses_barriers_for_reference_fields() {
    let mut h = Harness::new();
    let obj = h.alloc(32);
    let field = h.instance_field("next", "Ljava/lang/Object;", 16);
    let mm = RecordingMm::default();
    let ctx = h.ctx(BarrierSet::ALL, &mm);

    unsafe {
        field.set_word_unchecked(&ctx, obj, 0xABCD);
        assert_eq!(field.get_word_unchecked(&ctx, obj), 0xABCD);
    }
    assert!(mm.events().is_empty());
}

// ---------------------------------------------------------------------
// Boxed reads
// ---------------------------------------------------------------------

#[test]
fn boxed_reads_widen_per_declared_type() {
    let mut h = Harness::new();
    let obj = h.alloc(64);
    let flag = h.instance_field("flag", "Z", 0);
    let tiny = h.instance_field("tiny", "B", 1);
    let small = h.instance_field("small", "S", 2);
    let count = h.instance_field("count", "I", 4);
    let ticks = h.instance_field("ticks", "J", 8);
    let ratio = h.instance_field("ratio", "F", 16);
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);

    unsafe {
        flag.set_boolean_unchecked(&ctx, obj, true);
        tiny.set_byte_unchecked(&ctx, obj, -3);
        small.set_short_unchecked(&ctx, obj, -300);
        count.set_int_unchecked(&ctx, obj, 12345);
        ticks.set_long_unchecked(&ctx, obj, 1 << 40);
        ratio.set_float_unchecked(&ctx, obj, 1.5);

        assert_eq!(flag.get_value_unchecked(&ctx, obj), Value::Integer(1));
        assert_eq!(tiny.get_value_unchecked(&ctx, obj), Value::Integer(-3));
        assert_eq!(small.get_value_unchecked(&ctx, obj), Value::Integer(-300));
        assert_eq!(count.get_value_unchecked(&ctx, obj), Value::Integer(12345));
        assert_eq!(ticks.get_value_unchecked(&ctx, obj), Value::Long(1 << 40));
        assert_eq!(ratio.get_value_unchecked(&ctx, obj), Value::Float(1.5));
    }
}

#[test]
fn boxed_reads_distinguish_null_from_references() {
    let mut h = Harness::new();
    let obj = h.alloc(32);
    let target = h.alloc(8);
    let field = h.instance_field("next", "Ljava/lang/Object;", 0);
    let ctx = h.ctx(BarrierSet::NONE, &PassthroughBarriers);

    unsafe {
        assert_eq!(field.get_value_unchecked(&ctx, obj), Value::Null);
        field.set_object_unchecked(&ctx, obj, target);
        assert_eq!(field.get_value_unchecked(&ctx, obj), Value::Ref(target));
    }
}
