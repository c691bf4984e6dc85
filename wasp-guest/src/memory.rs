//! Allocation entry points exported to the host.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr;

/// Byte layout for a region of `size` bytes.
///
/// Zero-sized requests are rounded up to one byte so every region is a
/// distinct, non-null pointer.
fn layout(size: usize) -> Option<Layout> {
    Layout::from_size_align(size.max(1), 1).ok()
}

/// Allocates `size` uninitialized bytes the host may write into.
///
/// Returns null when the request cannot be satisfied.
#[unsafe(no_mangle)]
pub extern "C" fn allocate(size: usize) -> *mut u8 {
    match layout(size) {
        Some(layout) => unsafe { alloc(layout) },
        None => ptr::null_mut(),
    }
}

/// Releases a region obtained from [`allocate`]. Null is ignored.
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate`] called with the same
/// `size`, and must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn deallocate(ptr: *mut u8, size: usize) {
    if ptr.is_null() {
        return;
    }
    if let Some(layout) = layout(size) {
        unsafe { dealloc(ptr, layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_regions_are_valid_and_distinct() {
        let a = allocate(0);
        let b = allocate(0);
        assert!(!a.is_null());
        assert!(!b.is_null());
        assert_ne!(a, b);
        unsafe {
            deallocate(a, 0);
            deallocate(b, 0);
        }
    }

    #[test]
    fn region_is_writable_for_its_full_size() {
        let size = 64;
        let ptr = allocate(size);
        assert!(!ptr.is_null());
        unsafe {
            ptr::write_bytes(ptr, 0xab, size);
            assert_eq!(*ptr.add(size - 1), 0xab);
            deallocate(ptr, size);
        }
    }

    #[test]
    fn impossible_request_returns_null() {
        assert!(allocate(usize::MAX).is_null());
    }

    #[test]
    fn deallocate_ignores_null() {
        unsafe { deallocate(ptr::null_mut(), 16) };
    }
}
