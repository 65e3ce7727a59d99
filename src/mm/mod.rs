use crate::heap::statics::Statics;
use crate::heap::{Heap, HeapRef};
use crate::keys::FieldId;

/// Which reference accesses the collector wants mediated. Fixed at startup,
/// before any field access happens; the access protocol consults it on every
/// reference get/set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BarrierSet {
    pub static_read: bool,
    pub static_write: bool,
    pub instance_read: bool,
    pub instance_write: bool,
}

impl BarrierSet {
    pub const NONE: BarrierSet = BarrierSet {
        static_read: false,
        static_write: false,
        instance_read: false,
        instance_write: false,
    };

    pub const ALL: BarrierSet = BarrierSet {
        static_read: true,
        static_write: true,
        instance_read: true,
        instance_write: true,
    };
}

/// The memory manager's barrier entry points. A barrier owns the whole
/// access: it performs the load/store itself (plus whatever bookkeeping the
/// collector needs) so that the access protocol never doubles up with a
/// direct memory operation.
///
/// # Safety
/// Implementations receive the same caller-verified offsets the direct path
/// uses and must access exactly the addressed slot. The `FieldId` is for
/// instrumentation/sampling only.
pub trait MemoryManager: Sync {
    unsafe fn static_read_barrier(&self, statics: &Statics, offset: usize, field: FieldId)
    -> HeapRef;

    unsafe fn static_write_barrier(
        &self,
        statics: &Statics,
        offset: usize,
        value: HeapRef,
        field: FieldId,
    );

    unsafe fn instance_read_barrier(
        &self,
        heap: &Heap,
        obj: HeapRef,
        offset: usize,
        field: FieldId,
    ) -> HeapRef;

    unsafe fn instance_write_barrier(
        &self,
        heap: &Heap,
        obj: HeapRef,
        offset: usize,
        value: HeapRef,
        field: FieldId,
    );
}

/// The collector-less configuration: barriers degenerate to plain slot
/// access. Pair with [`BarrierSet::NONE`]; also the safety net if a barrier
/// set requests mediation the active collector does not actually need.
pub struct PassthroughBarriers;

impl MemoryManager for PassthroughBarriers {
    unsafe fn static_read_barrier(
        &self,
        statics: &Statics,
        offset: usize,
        _field: FieldId,
    ) -> HeapRef {
        unsafe { statics.get_slot_ref(offset) }
    }

    unsafe fn static_write_barrier(
        &self,
        statics: &Statics,
        offset: usize,
        value: HeapRef,
        _field: FieldId,
    ) {
        unsafe { statics.set_slot_ref(offset, value) }
    }

    unsafe fn instance_read_barrier(
        &self,
        heap: &Heap,
        obj: HeapRef,
        offset: usize,
        _field: FieldId,
    ) -> HeapRef {
        unsafe { heap.get_ref_at(obj, offset) }
    }

    unsafe fn instance_write_barrier(
        &self,
        heap: &Heap,
        obj: HeapRef,
        offset: usize,
        value: HeapRef,
        _field: FieldId,
    ) {
        unsafe { heap.set_ref_at(obj, offset, value) }
    }
}

/// Everything an unchecked field access needs: the two storages, the barrier
/// requirements and the memory manager that implements them. Built once at
/// VM startup and handed to the interpreter/compiled code by reference.
pub struct AccessContext<'a> {
    pub statics: &'a Statics,
    pub heap: &'a Heap,
    pub barriers: BarrierSet,
    pub mm: &'a dyn MemoryManager,
}
