//! SIMD-aligned storage.
//!
//! Every block handed out by [`aligned_alloc`] starts on a [`SIMD_ALIGNMENT`]
//! boundary. The block size is stored in a small header right before the
//! returned pointer so that [`aligned_free`] only needs the pointer back.
//!
//! [`AlignedVec`] plugs the same allocator into a resizable container, so
//! buffers created through it are over-aligned with no extra effort from the
//! caller.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

/// Alignment in bytes of every block produced by this module.
///
/// 64 bytes covers a cache line and the widest vector registers (AVX-512).
pub const SIMD_ALIGNMENT: usize = 64;

const HEADER: usize = SIMD_ALIGNMENT;

#[cold]
fn capacity_overflow() -> ! {
    panic!("aligned allocation size overflows usize")
}

fn block_layout<T>(count: usize) -> Layout {
    let bytes = count
        .checked_mul(mem::size_of::<T>())
        .and_then(|bytes| bytes.checked_add(HEADER))
        .unwrap_or_else(|| capacity_overflow());
    Layout::from_size_align(bytes, SIMD_ALIGNMENT).unwrap_or_else(|_| capacity_overflow())
}

/// Allocates uninitialised storage for `count` values of `T`, aligned to
/// [`SIMD_ALIGNMENT`].
///
/// The returned pointer is never null; allocation failure aborts through
/// [`handle_alloc_error`]. Release it with [`aligned_free`].
pub fn aligned_alloc<T>(count: usize) -> *mut T {
    let layout = block_layout::<T>(count);
    unsafe {
        let base = alloc(layout);
        if base.is_null() {
            handle_alloc_error(layout);
        }
        // the header occupies the first aligned slot, the total size sits at its end
        base.add(HEADER - mem::size_of::<usize>())
            .cast::<usize>()
            .write(layout.size());
        base.add(HEADER).cast::<T>()
    }
}

/// Releases a block returned by [`aligned_alloc`]. Null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a pointer obtained from [`aligned_alloc`] that has
/// not been freed yet.
pub unsafe fn aligned_free<T>(ptr: *mut T) {
    if ptr.is_null() {
        return;
    }
    let base = ptr.cast::<u8>().sub(HEADER);
    let size = base
        .add(HEADER - mem::size_of::<usize>())
        .cast::<usize>()
        .read();
    dealloc(base, Layout::from_size_align_unchecked(size, SIMD_ALIGNMENT));
}

/// Returns `true` when `ptr` sits on a [`SIMD_ALIGNMENT`] boundary.
pub fn is_aligned<T>(ptr: *const T) -> bool {
    (ptr as usize) % SIMD_ALIGNMENT == 0
}

/// A growable buffer of `Copy` values whose storage always comes from
/// [`aligned_alloc`].
pub struct AlignedVec<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
}

unsafe impl<T: Copy + Send> Send for AlignedVec<T> {}
unsafe impl<T: Copy + Sync> Sync for AlignedVec<T> {}

impl<T: Copy> AlignedVec<T> {
    /// Empty buffer; nothing is allocated until the first push.
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
        }
    }

    /// Empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }
        let ptr = unsafe { NonNull::new_unchecked(aligned_alloc::<T>(capacity)) };
        Self {
            ptr,
            len: 0,
            cap: capacity,
        }
    }

    /// Creates a buffer of `len` zeros.
    pub fn zeroed(len: usize) -> Self
    where
        T: num::Zero,
    {
        let mut data = Self::with_capacity(len);
        data.resize(len, T::zero());
        data
    }

    /// Aligned copy of `values`.
    pub fn from_slice(values: &[T]) -> Self {
        let mut data = Self::with_capacity(values.len());
        data.extend_from_slice(values);
        data
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Appends `value`, growing the storage when full.
    pub fn push(&mut self, value: T) {
        if self.len == self.cap {
            self.grow(1);
        }
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    /// Appends all of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        if values.is_empty() {
            return;
        }
        if self.cap - self.len < values.len() {
            self.grow(values.len());
        }
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.ptr.as_ptr().add(self.len), values.len());
        }
        self.len += values.len();
    }

    /// Resizes to `len` elements, filling new slots with `value`.
    pub fn resize(&mut self, len: usize, value: T) {
        if len <= self.len {
            self.len = len;
            return;
        }
        let additional = len - self.len;
        if self.cap - self.len < additional {
            self.grow(additional);
        }
        unsafe {
            let tail = slice::from_raw_parts_mut(self.ptr.as_ptr().add(self.len), additional);
            tail.fill(value);
        }
        self.len = len;
    }

    /// Drops every element and keeps the storage.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Aligned pointer to the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Aligned mutable pointer to the first element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn grow(&mut self, additional: usize) {
        let required = self
            .len
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        let new_cap = (self.cap.saturating_mul(2)).max(required).max(4);
        let new_ptr = aligned_alloc::<T>(new_cap);
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr, self.len);
            if self.cap != 0 {
                aligned_free(self.ptr.as_ptr());
            }
            self.ptr = NonNull::new_unchecked(new_ptr);
        }
        self.cap = new_cap;
    }
}

impl<T: Copy> Drop for AlignedVec<T> {
    fn drop(&mut self) {
        if self.cap != 0 {
            unsafe { aligned_free(self.ptr.as_ptr()) };
        }
    }
}

impl<T: Copy> Default for AlignedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Clone for AlignedVec<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for AlignedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: Copy + PartialEq> PartialEq for AlignedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Copy> Deref for AlignedVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Copy> DerefMut for AlignedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Copy> From<&[T]> for AlignedVec<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Copy> From<Vec<T>> for AlignedVec<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_slice(&values)
    }
}

impl<T: Copy> FromIterator<T> for AlignedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut data = Self::with_capacity(iter.size_hint().0);
        for value in iter {
            data.push(value);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::Complex;

    #[test]
    fn alloc_is_aligned() {
        for count in [1, 3, 17, 1024] {
            let ptr = aligned_alloc::<f32>(count);
            assert!(is_aligned(ptr), "count {count} gave {ptr:p}");
            unsafe {
                // the whole block is writable
                slice::from_raw_parts_mut(ptr, count).fill(1.5);
                aligned_free(ptr);
            }
        }

        let ptr = aligned_alloc::<Complex<f64>>(33);
        assert!(is_aligned(ptr));
        unsafe { aligned_free(ptr) };
    }

    #[test]
    fn free_null_is_noop() {
        unsafe { aligned_free::<f64>(ptr::null_mut()) };
    }

    #[test]
    fn zeroed_vector() {
        let v = AlignedVec::<f64>::zeroed(100);
        assert_eq!(v.len(), 100);
        assert!(v.iter().all(|&x| x == 0.0));
        assert!(is_aligned(v.as_ptr()));
    }

    #[test]
    fn growth_keeps_alignment_and_contents() {
        let mut v = AlignedVec::<f32>::new();
        assert!(v.is_empty());
        for i in 0..1000 {
            v.push(i as f32);
            assert!(is_aligned(v.as_ptr()));
        }
        assert_eq!(v.len(), 1000);
        assert!(v.iter().enumerate().all(|(i, &x)| x == i as f32));

        v.extend_from_slice(&[-1.0, -2.0]);
        assert_eq!(&v[998..], &[998.0, 999.0, -1.0, -2.0]);

        v.resize(3, 0.0);
        assert_eq!(v.as_slice(), &[0.0, 1.0, 2.0]);
        v.resize(5, 7.0);
        assert_eq!(v.as_slice(), &[0.0, 1.0, 2.0, 7.0, 7.0]);

        v.clear();
        assert!(v.is_empty());
        assert!(v.capacity() >= 1002);
    }

    #[test]
    fn conversions() {
        let v: AlignedVec<i32> = (0..5).collect();
        assert_eq!(v.as_slice(), &[0, 1, 2, 3, 4]);

        let w = AlignedVec::from(vec![0, 1, 2, 3, 4]);
        assert_eq!(v, w);

        let c = w.clone();
        assert_eq!(c, w);
        assert_ne!(c.as_ptr(), w.as_ptr());
        assert!(is_aligned(c.as_ptr()));
        assert_eq!(format!("{c:?}"), "[0, 1, 2, 3, 4]");
    }
}
