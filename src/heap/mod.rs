use crate::debug_error_log;
use crate::error::VmError;
use crate::keys::ClassId;
use std::num::NonZeroU32;

pub mod statics;

/// Byte offset of an object inside the heap arena. 0 is the null reference.
pub type HeapRef = usize;

/// Address-sized opaque value, for callers that need raw bit access to a
/// field without committing to a numeric interpretation.
pub type Word = usize;

#[repr(C)]
pub struct ObjectHeader {
    size: u32, // total bytes (header + data)
    class_id: NonZeroU32,
    marked: bool, // for GC in future
    _padding: [u8; 7],
}

impl ObjectHeader {
    const SIZE: usize = size_of::<ObjectHeader>();
}

/// Raw heap arena plus the typed get/set-by-offset facility the field access
/// protocol builds on. Offsets come from the object-layout pass; nothing here
/// validates them.
pub struct Heap {
    memory: *mut u8,
    capacity: usize,
    allocated: usize,
}

// Safety: Heap hands out raw memory on purpose; callers synchronize access
// exactly as they do for the objects themselves.
unsafe impl Send for Heap {}
unsafe impl Sync for Heap {}

impl Heap {
    pub const OBJECT_HEADER_SIZE: usize = ObjectHeader::SIZE;

    pub fn new(size_mb: usize) -> Result<Self, VmError> {
        let capacity = size_mb * 1024 * 1024;

        let memory = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };

        if memory == libc::MAP_FAILED {
            return Err(VmError::MmapFailed);
        }

        Ok(Heap {
            memory: memory as *mut u8,
            capacity,
            // heap offset 0 stays unused so that HeapRef 0 can mean null
            allocated: ObjectHeader::SIZE,
        })
    }

    fn alloc_raw(&mut self, size: usize) -> Result<HeapRef, VmError> {
        let total_needed = ObjectHeader::SIZE + size;

        // align to 8 bytes
        let aligned_total = (total_needed + 7) & !7;

        if self.allocated + aligned_total > self.capacity {
            return Err(VmError::OutOfMemory);
        }

        let offset = self.allocated;
        self.allocated += aligned_total;

        // zero initialize
        let data_ptr = unsafe { self.data_ptr(offset) };
        unsafe {
            std::ptr::write_bytes(data_ptr, 0, size);
        }

        Ok(offset)
    }

    pub fn alloc_instance(
        &mut self,
        instance_size: usize,
        class_id: ClassId,
    ) -> Result<HeapRef, VmError> {
        let heap_ref = self.alloc_raw(instance_size)?;

        let header = self.header_mut(heap_ref);
        header.class_id = class_id.into_inner();
        header.size = (ObjectHeader::SIZE + instance_size) as u32;
        header.marked = false;

        Ok(heap_ref)
    }

    pub fn class_id(&self, heap_ref: HeapRef) -> ClassId {
        ClassId::new(self.header(heap_ref).class_id)
    }

    fn header_mut(&mut self, heap_ref: HeapRef) -> &mut ObjectHeader {
        unsafe { &mut *(self.memory.add(heap_ref) as *mut ObjectHeader) }
    }

    fn header(&self, heap_ref: HeapRef) -> &ObjectHeader {
        unsafe { &*(self.memory.add(heap_ref) as *const ObjectHeader) }
    }

    unsafe fn data_ptr(&self, heap_ref: HeapRef) -> *mut u8 {
        unsafe { self.memory.add(heap_ref + ObjectHeader::SIZE) }
    }

    unsafe fn field_ptr(&self, obj: HeapRef, offset: usize) -> *mut u8 {
        unsafe { self.data_ptr(obj).add(offset) }
    }
}

/// Typed raw access at a byte offset inside an object's instance storage.
///
/// # Safety
/// `obj` must be a live object allocated by this heap and `offset` a valid,
/// suitably aligned field offset within it, with the width of the accessed
/// type. Concurrent access to the same field is the caller's problem, as it
/// is for the mutator code this backs.
impl Heap {
    pub unsafe fn get_byte_at(&self, obj: HeapRef, offset: usize) -> i8 {
        unsafe { *(self.field_ptr(obj, offset) as *const i8) }
    }

    pub unsafe fn get_unsigned_byte_at(&self, obj: HeapRef, offset: usize) -> u8 {
        unsafe { *self.field_ptr(obj, offset) }
    }

    pub unsafe fn get_char_at(&self, obj: HeapRef, offset: usize) -> u16 {
        unsafe { *(self.field_ptr(obj, offset) as *const u16) }
    }

    pub unsafe fn get_short_at(&self, obj: HeapRef, offset: usize) -> i16 {
        unsafe { *(self.field_ptr(obj, offset) as *const i16) }
    }

    pub unsafe fn get_int_at(&self, obj: HeapRef, offset: usize) -> i32 {
        unsafe { *(self.field_ptr(obj, offset) as *const i32) }
    }

    pub unsafe fn get_long_at(&self, obj: HeapRef, offset: usize) -> i64 {
        unsafe { *(self.field_ptr(obj, offset) as *const i64) }
    }

    pub unsafe fn get_word_at(&self, obj: HeapRef, offset: usize) -> Word {
        unsafe { *(self.field_ptr(obj, offset) as *const Word) }
    }

    pub unsafe fn get_ref_at(&self, obj: HeapRef, offset: usize) -> HeapRef {
        unsafe { *(self.field_ptr(obj, offset) as *const HeapRef) }
    }

    pub unsafe fn set_byte_at(&self, obj: HeapRef, offset: usize, value: i8) {
        unsafe { *(self.field_ptr(obj, offset) as *mut i8) = value }
    }

    pub unsafe fn set_unsigned_byte_at(&self, obj: HeapRef, offset: usize, value: u8) {
        unsafe { *self.field_ptr(obj, offset) = value }
    }

    pub unsafe fn set_char_at(&self, obj: HeapRef, offset: usize, value: u16) {
        unsafe { *(self.field_ptr(obj, offset) as *mut u16) = value }
    }

    pub unsafe fn set_short_at(&self, obj: HeapRef, offset: usize, value: i16) {
        unsafe { *(self.field_ptr(obj, offset) as *mut i16) = value }
    }

    pub unsafe fn set_int_at(&self, obj: HeapRef, offset: usize, value: i32) {
        unsafe { *(self.field_ptr(obj, offset) as *mut i32) = value }
    }

    pub unsafe fn set_long_at(&self, obj: HeapRef, offset: usize, value: i64) {
        unsafe { *(self.field_ptr(obj, offset) as *mut i64) = value }
    }

    pub unsafe fn set_word_at(&self, obj: HeapRef, offset: usize, value: Word) {
        unsafe { *(self.field_ptr(obj, offset) as *mut Word) = value }
    }

    pub unsafe fn set_ref_at(&self, obj: HeapRef, offset: usize, value: HeapRef) {
        unsafe { *(self.field_ptr(obj, offset) as *mut HeapRef) = value }
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        unsafe {
            let result = libc::munmap(self.memory as *mut libc::c_void, self.capacity);
            if result != 0 {
                debug_error_log!("munmap failed during Heap drop");
            }
        }
    }
}
