use crate::debug_error_log;
use crate::error::VmError;
use crate::heap::{HeapRef, Word};

const WORD: usize = size_of::<Word>();

/// Process-wide table of shared (static) field slots, addressed by byte
/// offset. The table is word-granular: narrow integral values are widened to
/// an `i32` slot on store and narrowed back on load, so every slot occupies a
/// whole number of words regardless of the field's declared width.
pub struct Statics {
    memory: *mut u8,
    capacity: usize,
    reserved: usize,
}

// Safety: same deal as Heap; the table is shared mutable storage by design
// and the accessors carry the synchronization contract.
unsafe impl Send for Statics {}
unsafe impl Sync for Statics {}

impl Statics {
    pub fn new(size_kb: usize) -> Result<Self, VmError> {
        let capacity = size_kb * 1024;

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

        Ok(Statics {
            memory: memory as *mut u8,
            capacity,
            reserved: 0,
        })
    }

    /// Reserves storage for one static field and returns its slot offset.
    /// Values narrower than a word still get a full word; 8-byte values get
    /// two words on 32-bit targets.
    pub fn reserve(&mut self, width_bytes: usize) -> Result<usize, VmError> {
        let words = width_bytes.div_ceil(WORD).max(1);
        let size = words * WORD;
        if self.reserved + size > self.capacity {
            return Err(VmError::OutOfStaticStorage {
                requested: size,
                capacity: self.capacity,
            });
        }
        let offset = self.reserved;
        self.reserved += size;
        Ok(offset)
    }

    pub fn reserved_bytes(&self) -> usize {
        self.reserved
    }

    unsafe fn slot_ptr(&self, offset: usize) -> *mut u8 {
        unsafe { self.memory.add(offset) }
    }
}

/// Typed access to one slot.
///
/// # Safety
/// `offset` must have been returned by [`Statics::reserve`] and the accessed
/// width must fit the reservation. The table does no synchronization; callers
/// needing ordering (volatile fields) fence around these calls themselves.
impl Statics {
    pub unsafe fn get_slot_i32(&self, offset: usize) -> i32 {
        unsafe { *(self.slot_ptr(offset) as *const i32) }
    }

    pub unsafe fn get_slot_i64(&self, offset: usize) -> i64 {
        unsafe { *(self.slot_ptr(offset) as *const i64) }
    }

    pub unsafe fn get_slot_word(&self, offset: usize) -> Word {
        unsafe { *(self.slot_ptr(offset) as *const Word) }
    }

    pub unsafe fn get_slot_ref(&self, offset: usize) -> HeapRef {
        unsafe { *(self.slot_ptr(offset) as *const HeapRef) }
    }

    pub unsafe fn set_slot_i32(&self, offset: usize, value: i32) {
        unsafe { *(self.slot_ptr(offset) as *mut i32) = value }
    }

    pub unsafe fn set_slot_i64(&self, offset: usize, value: i64) {
        unsafe { *(self.slot_ptr(offset) as *mut i64) = value }
    }

    pub unsafe fn set_slot_word(&self, offset: usize, value: Word) {
        unsafe { *(self.slot_ptr(offset) as *mut Word) = value }
    }

    pub unsafe fn set_slot_ref(&self, offset: usize, value: HeapRef) {
        unsafe { *(self.slot_ptr(offset) as *mut HeapRef) = value }
    }
}

impl Drop for Statics {
    fn drop(&mut self) {
        unsafe {
            let result = libc::munmap(self.memory as *mut libc::c_void, self.capacity);
            if result != 0 {
                debug_error_log!("munmap failed during Statics drop");
            }
        }
    }
}
