use std::alloc::{alloc, dealloc, Layout};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use num::Zero;

use crate::error::{allocation_error, layout_error, Result};

/// Alignment of every benchmark buffer, in bytes.
///
/// Matches the width of a 256-bit vector register so that the first element of
/// every lane-sized chunk sits on a register boundary.
pub const BUFFER_ALIGNMENT: usize = 32;

/// A fixed-length, aligned, owned buffer.
///
/// Benchmark fixtures hold their inputs in `AlignedVec`s: the length is fixed at
/// construction and there is no way to grow or shrink it afterwards, so a
/// buffer's allocation can never be replaced while measurements run.
///
/// # Memory Safety
///
/// - Uses `std::alloc::alloc()` for allocation and `std::alloc::dealloc()` with the
///   same layout for cleanup
/// - Every element is written with `T::zero()` before the buffer is handed out
/// - All operations are memory-safe despite internal `unsafe` code
///
/// # Example
///
/// ```rust
/// use lanebench::utils::{AlignedVec, BUFFER_ALIGNMENT};
///
/// let mut buffer = AlignedVec::<u64>::zeroed(8, BUFFER_ALIGNMENT).unwrap();
/// buffer[3] = 7;
/// assert_eq!(buffer.iter().sum::<u64>(), 7);
/// assert_eq!(buffer.as_ptr() as usize % BUFFER_ALIGNMENT, 0);
/// ```
pub struct AlignedVec<T> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

impl<T: Zero + Copy> AlignedVec<T> {
    /// Allocates `len` elements aligned to `align` bytes, all set to zero.
    ///
    /// # Errors
    ///
    /// Returns a layout error when `align` is not a power of two, is smaller than
    /// the natural alignment of `T`, or the total size overflows. Returns an
    /// allocation error when the allocator cannot provide the memory.
    pub fn zeroed(len: usize, align: usize) -> Result<Self> {
        if !align.is_power_of_two() || align < mem::align_of::<T>() {
            return Err(layout_error(
                len,
                align,
                "alignment must be a power of two no smaller than the element alignment",
            ));
        }

        let size = len.checked_mul(mem::size_of::<T>()).ok_or_else(|| {
            layout_error(len, align, "requested size overflows usize")
        })?;

        let layout = Layout::from_size_align(size, align)
            .map_err(|e| layout_error(size, align, e.to_string()))?;

        let ptr = if layout.size() == 0 {
            // Zero-sized buffers never touch the allocator; the pointer only has to be aligned.
            match NonNull::new(align as *mut T) {
                Some(p) => p,
                None => return Err(layout_error(size, align, "null dangling pointer")),
            }
        } else {
            let raw = unsafe { alloc(layout) } as *mut T;
            match NonNull::new(raw) {
                Some(p) => p,
                None => {
                    return Err(allocation_error(
                        size,
                        align,
                        "allocator returned a null pointer",
                    ))
                }
            }
        };

        for i in 0..len {
            // SAFETY: `i < len` and the allocation holds `len` elements of `T`.
            unsafe { ptr.as_ptr().add(i).write(T::zero()) };
        }

        Ok(AlignedVec { ptr, len, layout })
    }
}

impl<T> Drop for AlignedVec<T> {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            unsafe {
                dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
            }
        }
    }
}

impl<T> Deref for AlignedVec<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for AlignedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AlignedVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SAFETY: AlignedVec uniquely owns its allocation, like Vec<T>.
unsafe impl<T: Send> Send for AlignedVec<T> {}
unsafe impl<T: Sync> Sync for AlignedVec<T> {}
