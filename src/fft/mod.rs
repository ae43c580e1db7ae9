//! The user-facing transform object.
//!
//! [`Fft`] owns a [`Setup`] and the scratch memory the engine works in. It
//! offers two call shapes over one core:
//!
//! * checked: slices in, slices out. [`AlignedVec`] derefs into them, so the
//!   buffers returned by [`Fft::value_vector`] and friends plug in directly.
//!   Buffer lengths are asserted before anything is touched.
//! * raw (`*_raw`): pointers to caller-managed memory, typically from
//!   [`Fft::aligned_alloc_value`] and friends. Nothing is checked, and
//!   buffers may alias where the operation allows it.

use std::fmt;
use std::ptr;

use tracing::{debug, trace};

use crate::aligned::{self, AlignedVec};
use crate::engine::STACK_WORK_CAPACITY;
use crate::error::FftError;
use crate::kind::{ComplexOf, Direction, FftKind};
use crate::setup::Setup;


/// Lengths up to this value keep the scratch memory on the call frame.
pub const DEFAULT_STACK_THRESHOLD: usize = 4096;

/// Largest stack threshold accepted; bigger requests are rejected with
/// [`FftError::StackThreshold`].
pub const MAX_STACK_THRESHOLD: usize = STACK_WORK_CAPACITY / 2;

/// Fixed-length forward/inverse transform of values of kind `K`.
///
/// Transforms are not scaled: `inverse(forward(x)) == N * x`.
///
/// For complex kinds the ordered spectrum has `N` bins; bin `k < N / 2` is
/// frequency `k * Fs / N` and bin `k >= N / 2` is `(k - N) * Fs / N`.
///
/// For real kinds the ordered spectrum has `N / 2` bins; bin `k >= 1` is
/// frequency `k * Fs / N`, and bin 0 packs the two real-valued edge terms:
/// its real part is DC, its imaginary part is Nyquist (`Fs / 2`).
///
/// An `Fft` is not internally synchronised; every operation takes `&mut
/// self` or only reads immutable state.
pub struct Fft<K: FftKind> {
    setup: Setup<K>,
    work: Option<AlignedVec<K::Scalar>>,
    length: usize,
    stack_threshold: usize,
}

impl<K: FftKind> Fft<K> {
    /// Prepares a transform of `length` samples with the default stack
    /// threshold.
    pub fn new(length: usize) -> Result<Self, FftError> {
        Self::with_stack_threshold(length, DEFAULT_STACK_THRESHOLD)
    }

    /// Prepares a transform of `length` samples. Lengths above
    /// `stack_threshold` get heap scratch memory, smaller ones use the call
    /// frame.
    ///
    /// Fails when `stack_threshold` exceeds [`MAX_STACK_THRESHOLD`], the
    /// largest length whose scratch fits the engine's call-frame buffer.
    pub fn with_stack_threshold(length: usize, stack_threshold: usize) -> Result<Self, FftError> {
        if stack_threshold > MAX_STACK_THRESHOLD {
            return Err(FftError::StackThreshold {
                threshold: stack_threshold,
                max: MAX_STACK_THRESHOLD,
            });
        }

        let mut fft = Self {
            setup: Setup::new(),
            work: None,
            length: 0,
            stack_threshold,
        };
        fft.prepare_length(length)?;
        Ok(fft)
    }

    /// Prepares for `length` samples. This plans the transform; it is not a
    /// plain setter.
    ///
    /// Nothing happens when neither the length nor the scratch placement
    /// change. `0` leaves the object unusable until the next non-zero call.
    /// On error the object is left in that same unusable state.
    pub fn prepare_length(&mut self, length: usize) -> Result<(), FftError> {
        let was_on_heap = self.work.is_some();
        let use_heap = length > self.stack_threshold;
        if use_heap == was_on_heap && length == self.length {
            trace!(length, "FFT already prepared");
            return Ok(());
        }

        self.work = None;
        if let Err(err) = self.setup.prepare_length(length) {
            self.length = 0;
            return Err(err);
        }
        self.length = length;
        if use_heap {
            self.work = Some(AlignedVec::zeroed(self.internal_layout_size()));
        }
        debug!(length, heap_scratch = use_heap, "FFT prepared");
        Ok(())
    }

    /// Prepared length, `0` when unusable.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Largest length that keeps scratch memory on the call frame.
    #[inline]
    pub fn stack_threshold(&self) -> usize {
        self.stack_threshold
    }

    /// Whether the current length uses heap scratch memory.
    #[inline]
    pub fn is_scratch_on_heap(&self) -> bool {
        self.work.is_some()
    }

    /// Bins in the ordered spectrum: `N` for complex kinds, `N / 2` for real
    /// kinds.
    #[inline]
    pub fn spectrum_size(&self) -> usize {
        if K::is_complex_transform() {
            self.length
        } else {
            self.length / 2
        }
    }

    /// Scalars in an internal-layout spectrum: `2N` for complex kinds, `N`
    /// for real kinds.
    #[inline]
    pub fn internal_layout_size(&self) -> usize {
        if K::is_complex_transform() {
            2 * self.length
        } else {
            self.length
        }
    }

    /// Whether `K` is a complex kind.
    pub fn is_complex_transform() -> bool {
        K::is_complex_transform()
    }

    /// Whether `K` computes in `f32`.
    pub fn is_float_scalar() -> bool {
        K::is_float_scalar()
    }

    /// Whether `K` computes in `f64`.
    pub fn is_double_scalar() -> bool {
        K::is_double_scalar()
    }

    /// Smallest valid transform length for `K`.
    pub fn min_fft_size() -> usize {
        K::min_fft_size()
    }

    /// See [`crate::next_power_of_two`]; panics when the result overflows.
    pub fn next_power_of_two(n: usize) -> usize {
        K::next_power_of_two(n)
    }

    /// Whether `n` is a power of two; `0` is not.
    pub fn is_power_of_two(n: usize) -> bool {
        K::is_power_of_two(n)
    }

    /// Lanes of `K::Scalar` in one vector register.
    pub fn simd_width() -> usize {
        K::simd_width()
    }

    /// Name of the detected vector instruction set.
    pub fn simd_arch() -> &'static str {
        K::simd_arch()
    }

    /// Zeroed value buffer of [`Self::length`] elements.
    pub fn value_vector(&self) -> AlignedVec<K> {
        AlignedVec::zeroed(self.length)
    }

    /// Zeroed ordered spectrum of [`Self::spectrum_size`] bins.
    pub fn spectrum_vector(&self) -> AlignedVec<ComplexOf<K>> {
        AlignedVec::zeroed(self.spectrum_size())
    }

    /// Zeroed internal-layout spectrum of [`Self::internal_layout_size`]
    /// scalars.
    pub fn internal_layout_vector(&self) -> AlignedVec<K::Scalar> {
        AlignedVec::zeroed(self.internal_layout_size())
    }

    #[track_caller]
    fn check(&self, op: &str, buffers: &[(&str, usize, usize)]) {
        assert!(
            self.setup.is_prepared(),
            "{op}: FFT is not prepared, call prepare_length with a valid length first"
        );
        for &(name, actual, expected) in buffers {
            assert!(
                actual == expected,
                "{op}: `{name}` has {actual} elements, expected {expected}"
            );
        }
    }

    /// Forward transform into the ordered spectrum. Returns `spectrum`.
    #[track_caller]
    pub fn forward<'a>(
        &mut self,
        input: &[K],
        spectrum: &'a mut [ComplexOf<K>],
    ) -> &'a mut [ComplexOf<K>] {
        self.check(
            "forward",
            &[
                ("input", input.len(), self.length),
                ("spectrum", spectrum.len(), self.spectrum_size()),
            ],
        );
        unsafe { self.forward_raw(input.as_ptr(), spectrum.as_mut_ptr()) };
        spectrum
    }

    /// Inverse of [`Self::forward`], scaled by `N`. Returns `output`.
    #[track_caller]
    pub fn inverse<'a>(&mut self, spectrum: &[ComplexOf<K>], output: &'a mut [K]) -> &'a mut [K] {
        self.check(
            "inverse",
            &[
                ("spectrum", spectrum.len(), self.spectrum_size()),
                ("output", output.len(), self.length),
            ],
        );
        unsafe { self.inverse_raw(spectrum.as_ptr(), output.as_mut_ptr()) };
        output
    }

    /// Forward transform into the engine's internal layout, skipping the
    /// reordering pass. The result is meant for [`Self::convolve`],
    /// [`Self::convolve_accumulate`], [`Self::reorder_spectrum`] or
    /// [`Self::inverse_from_internal_layout`].
    #[track_caller]
    pub fn forward_to_internal_layout<'a>(
        &mut self,
        input: &[K],
        internal: &'a mut [K::Scalar],
    ) -> &'a mut [K::Scalar] {
        self.check(
            "forward_to_internal_layout",
            &[
                ("input", input.len(), self.length),
                ("internal", internal.len(), self.internal_layout_size()),
            ],
        );
        unsafe { self.forward_to_internal_layout_raw(input.as_ptr(), internal.as_mut_ptr()) };
        internal
    }

    /// Inverse of [`Self::forward_to_internal_layout`], scaled by `N`. Returns `output`.
    #[track_caller]
    pub fn inverse_from_internal_layout<'a>(
        &mut self,
        internal: &[K::Scalar],
        output: &'a mut [K],
    ) -> &'a mut [K] {
        self.check(
            "inverse_from_internal_layout",
            &[
                ("internal", internal.len(), self.internal_layout_size()),
                ("output", output.len(), self.length),
            ],
        );
        unsafe { self.inverse_from_internal_layout_raw(internal.as_ptr(), output.as_mut_ptr()) };
        output
    }

    /// Converts an internal-layout spectrum into the ordered one.
    #[track_caller]
    pub fn reorder_spectrum(&self, internal: &[K::Scalar], spectrum: &mut [ComplexOf<K>]) {
        self.check(
            "reorder_spectrum",
            &[
                ("internal", internal.len(), self.internal_layout_size()),
                ("spectrum", spectrum.len(), self.spectrum_size()),
            ],
        );
        unsafe { self.reorder_spectrum_raw(internal.as_ptr(), spectrum.as_mut_ptr()) };
    }

    /// `ab = a * b * scaling` on internal-layout spectra that were not
    /// reordered. Returns `ab`.
    #[track_caller]
    pub fn convolve<'a>(
        &self,
        a: &[K::Scalar],
        b: &[K::Scalar],
        ab: &'a mut [K::Scalar],
        scaling: K::Scalar,
    ) -> &'a mut [K::Scalar] {
        self.check_convolve("convolve", a, b, ab);
        unsafe { self.convolve_raw(a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), scaling) };
        ab
    }

    /// `ab += a * b * scaling` on internal-layout spectra. Returns `ab`.
    #[track_caller]
    pub fn convolve_accumulate<'a>(
        &self,
        a: &[K::Scalar],
        b: &[K::Scalar],
        ab: &'a mut [K::Scalar],
        scaling: K::Scalar,
    ) -> &'a mut [K::Scalar] {
        self.check_convolve("convolve_accumulate", a, b, ab);
        unsafe { self.convolve_accumulate_raw(a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), scaling) };
        ab
    }

    #[track_caller]
    fn check_convolve(&self, op: &str, a: &[K::Scalar], b: &[K::Scalar], ab: &[K::Scalar]) {
        let expected = self.internal_layout_size();
        self.check(
            op,
            &[
                ("a", a.len(), expected),
                ("b", b.len(), expected),
                ("ab", ab.len(), expected),
            ],
        );
    }

    fn work_ptr(&mut self) -> *mut K::Scalar {
        self.work
            .as_mut()
            .map_or(ptr::null_mut(), |work| work.as_mut_ptr())
    }

    /// # Safety
    ///
    /// `input` must be valid for [`Self::length`] values and `spectrum` for
    /// [`Self::spectrum_size`] bins. They may alias. Panics when not
    /// prepared.
    pub unsafe fn forward_raw(
        &mut self,
        input: *const K,
        spectrum: *mut ComplexOf<K>,
    ) -> *mut ComplexOf<K> {
        let work = self.work_ptr();
        self.setup
            .transform_ordered(input.cast(), spectrum.cast(), work, Direction::Forward);
        spectrum
    }

    /// # Safety
    ///
    /// `spectrum` must be valid for [`Self::spectrum_size`] bins and `output`
    /// for [`Self::length`] values. They may alias. Panics when not prepared.
    pub unsafe fn inverse_raw(&mut self, spectrum: *const ComplexOf<K>, output: *mut K) -> *mut K {
        let work = self.work_ptr();
        self.setup
            .transform_ordered(spectrum.cast(), output.cast(), work, Direction::Backward);
        output
    }

    /// # Safety
    ///
    /// `input` must be valid for [`Self::length`] values and `internal` for
    /// [`Self::internal_layout_size`] scalars. They may alias. Panics when
    /// not prepared.
    pub unsafe fn forward_to_internal_layout_raw(
        &mut self,
        input: *const K,
        internal: *mut K::Scalar,
    ) -> *mut K::Scalar {
        let work = self.work_ptr();
        self.setup
            .transform(input.cast(), internal, work, Direction::Forward);
        internal
    }

    /// # Safety
    ///
    /// `internal` must be valid for [`Self::internal_layout_size`] scalars
    /// and `output` for [`Self::length`] values. They may alias. Panics when
    /// not prepared.
    pub unsafe fn inverse_from_internal_layout_raw(
        &mut self,
        internal: *const K::Scalar,
        output: *mut K,
    ) -> *mut K {
        let work = self.work_ptr();
        self.setup
            .transform(internal, output.cast(), work, Direction::Backward);
        output
    }

    /// # Safety
    ///
    /// `internal` must be valid for [`Self::internal_layout_size`] scalars
    /// and `spectrum` for [`Self::spectrum_size`] bins. They must not
    /// overlap. Panics when not prepared.
    pub unsafe fn reorder_spectrum_raw(&self, internal: *const K::Scalar, spectrum: *mut ComplexOf<K>) {
        self.setup
            .reorder(internal, spectrum.cast(), Direction::Forward);
    }

    /// # Safety
    ///
    /// All buffers must be valid for [`Self::internal_layout_size`] scalars.
    /// They may alias pairwise. Panics when not prepared.
    pub unsafe fn convolve_raw(
        &self,
        a: *const K::Scalar,
        b: *const K::Scalar,
        ab: *mut K::Scalar,
        scaling: K::Scalar,
    ) -> *mut K::Scalar {
        self.setup.convolve(a, b, ab, scaling);
        ab
    }

    /// # Safety
    ///
    /// See [`Self::convolve_raw`].
    pub unsafe fn convolve_accumulate_raw(
        &self,
        a: *const K::Scalar,
        b: *const K::Scalar,
        ab: *mut K::Scalar,
        scaling: K::Scalar,
    ) -> *mut K::Scalar {
        self.setup.convolve_accumulate(a, b, ab, scaling);
        ab
    }

    /// Aligned storage for `length` values, released with
    /// [`Self::aligned_free`].
    pub fn aligned_alloc_value(length: usize) -> *mut K {
        K::aligned_alloc(length)
    }

    /// Aligned storage for `length` scalars.
    pub fn aligned_alloc_scalar(length: usize) -> *mut K::Scalar {
        aligned::aligned_alloc(length)
    }

    /// Aligned storage for `length` spectral bins.
    pub fn aligned_alloc_complex(length: usize) -> *mut ComplexOf<K> {
        aligned::aligned_alloc(length)
    }

    /// # Safety
    ///
    /// See [`aligned::aligned_free`].
    pub unsafe fn aligned_free<T>(ptr: *mut T) {
        aligned::aligned_free(ptr)
    }
}

impl<K: FftKind> fmt::Debug for Fft<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft")
            .field("length", &self.length)
            .field("stack_threshold", &self.stack_threshold)
            .field("heap_scratch", &self.work.is_some())
            .field("setup", &self.setup)
            .finish()
    }
}
