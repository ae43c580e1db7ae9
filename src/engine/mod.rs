//! The FFT engine behind [`crate::Setup`].
//!
//! An [`EngineSetup`] is created for one `(length, domain)` pair and speaks a
//! narrow pointer protocol: every buffer is an interleaved array of scalars.
//! Kernels come from `rustfft` (complex) and `realfft` (real-to-complex); the
//! rest of the crate never sees them.
//!
//! # Layouts
//!
//! Complex domain, length `N`: value buffers and spectra hold `2N`
//! interleaved scalars. The internal layout is the natural output order,
//! which already is the canonical one.
//!
//! Real domain, length `N` (`M = N / 2`): value buffers and spectra hold `N`
//! scalars.
//!
//! * ordered: `[X0, XM, Re X1, Im X1, ..., Re X(M-1), Im X(M-1)]`
//! * internal: `[X0, Re X1, Im X1, ..., Re X(M-1), Im X(M-1), XM]`
//!
//! `X0` (DC) and `XM` (Nyquist) are real for real input.

use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;

use tracing::{debug, warn};

use crate::aligned::AlignedVec;
use crate::kind::{is_valid_size, min_fft_size, Direction, Domain, FftScalar};

mod complex;
mod real;


use complex::ComplexPlan;
use real::RealPlan;

/// Scalars available in the call-frame work buffer used when no work
/// pointer is supplied.
pub const STACK_WORK_CAPACITY: usize = 8192;

enum Plan<S: FftScalar> {
    Real(RealPlan<S>),
    Complex(ComplexPlan<S>),
}

/// One prepared engine instance.
pub struct EngineSetup<S: FftScalar> {
    length: usize,
    plan: Plan<S>,
}

impl<S: FftScalar> EngineSetup<S> {
    /// Plans a transform of `length` samples, or returns `None` when the
    /// engine does not support that length (see [`is_valid_size`]).
    pub fn new(length: usize, domain: Domain) -> Option<Self> {
        if !is_valid_size(length, domain) {
            debug!(
                length,
                ?domain,
                min = min_fft_size(domain),
                "engine refused setup"
            );
            return None;
        }

        let plan = match domain {
            Domain::Real => Plan::Real(RealPlan::new(length)),
            Domain::Complex => Plan::Complex(ComplexPlan::new(length)),
        };
        debug!(length, ?domain, "engine setup created");

        Some(Self { length, plan })
    }

    /// Transform length in values.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether the setup transforms real or complex data.
    #[inline]
    pub fn domain(&self) -> Domain {
        match self.plan {
            Plan::Real(_) => Domain::Real,
            Plan::Complex(_) => Domain::Complex,
        }
    }

    /// Scalars in one value buffer, which is also the size of one spectrum in
    /// either layout.
    #[inline]
    pub fn scalar_len(&self) -> usize {
        match self.plan {
            Plan::Real(_) => self.length,
            Plan::Complex(_) => 2 * self.length,
        }
    }

    /// Unnormalised transform with the spectrum in the canonical order.
    ///
    /// # Safety
    ///
    /// `input` and `output` must be valid for [`Self::scalar_len`] scalars and
    /// may alias each other. `work` must be null or valid for
    /// [`Self::scalar_len`] scalars and must not overlap either buffer.
    pub unsafe fn transform_ordered(
        &mut self,
        input: *const S,
        output: *mut S,
        work: *mut S,
        direction: Direction,
    ) {
        self.run(input, output, work, direction, true);
    }

    /// Same as [`Self::transform_ordered`] with the spectrum in the internal
    /// layout.
    ///
    /// # Safety
    ///
    /// See [`Self::transform_ordered`].
    pub unsafe fn transform(
        &mut self,
        input: *const S,
        output: *mut S,
        work: *mut S,
        direction: Direction,
    ) {
        self.run(input, output, work, direction, false);
    }

    unsafe fn run(
        &mut self,
        input: *const S,
        output: *mut S,
        work: *mut S,
        direction: Direction,
        ordered: bool,
    ) {
        let len = self.scalar_len();
        with_work(work, len, |work| match &mut self.plan {
            Plan::Real(plan) => plan.process(input, output, work, direction, ordered),
            Plan::Complex(plan) => plan.process(input, output, work, direction),
        });
    }

    /// `Forward` converts internal layout to canonical order, `Backward` the
    /// other way round.
    ///
    /// # Safety
    ///
    /// Both buffers must be valid for [`Self::scalar_len`] scalars and must
    /// not overlap.
    pub unsafe fn reorder(&self, input: *const S, output: *mut S, direction: Direction) {
        match &self.plan {
            Plan::Real(plan) => plan.reorder(input, output, direction),
            Plan::Complex(_) => ptr::copy(input, output, 2 * self.length),
        }
    }

    /// `ab = a * b * scaling`, or `ab += a * b * scaling` when `accumulate`,
    /// on spectra in the internal layout.
    ///
    /// # Safety
    ///
    /// All three buffers must be valid for [`Self::scalar_len`] scalars. They
    /// may alias pairwise.
    pub unsafe fn convolve(
        &self,
        a: *const S,
        b: *const S,
        ab: *mut S,
        scaling: S,
        accumulate: bool,
    ) {
        match &self.plan {
            Plan::Real(_) => real::convolve(self.length, a, b, ab, scaling, accumulate),
            Plan::Complex(_) => multiply_pairs(a, b, ab, self.length, scaling, accumulate),
        }
    }
}

impl<S: FftScalar> fmt::Debug for EngineSetup<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSetup")
            .field("length", &self.length)
            .field("domain", &self.domain())
            .finish()
    }
}

/// Runs `f` with a work area of at least `len` scalars: the caller's when
/// given, otherwise one on the call frame.
unsafe fn with_work<S: FftScalar, R>(work: *mut S, len: usize, f: impl FnOnce(*mut S) -> R) -> R {
    if !work.is_null() {
        return f(work);
    }

    if len <= STACK_WORK_CAPACITY {
        let mut frame = [MaybeUninit::<S>::uninit(); STACK_WORK_CAPACITY];
        f(frame.as_mut_ptr().cast())
    } else {
        warn!(
            len,
            capacity = STACK_WORK_CAPACITY,
            "work buffer does not fit the call frame, using a transient heap buffer"
        );
        let mut heap = AlignedVec::<S>::zeroed(len);
        f(heap.as_mut_ptr())
    }
}

/// Complex multiply(-accumulate) over `pairs` interleaved values. Each pair
/// is read completely before it is written, so the buffers may alias.
#[inline]
unsafe fn multiply_pairs<S: FftScalar>(
    a: *const S,
    b: *const S,
    ab: *mut S,
    pairs: usize,
    scaling: S,
    accumulate: bool,
) {
    for i in 0..pairs {
        let (re, im) = (2 * i, 2 * i + 1);
        let (ar, ai) = (*a.add(re), *a.add(im));
        let (br, bi) = (*b.add(re), *b.add(im));

        let pr = (ar * br - ai * bi) * scaling;
        let pi = (ar * bi + ai * br) * scaling;

        if accumulate {
            *ab.add(re) = *ab.add(re) + pr;
            *ab.add(im) = *ab.add(im) + pi;
        } else {
            *ab.add(re) = pr;
            *ab.add(im) = pi;
        }
    }
}

/// Real multiply(-accumulate) of a single scalar bin.
#[inline]
unsafe fn multiply_scalar<S: FftScalar>(
    a: *const S,
    b: *const S,
    ab: *mut S,
    scaling: S,
    accumulate: bool,
) {
    let product = *a * *b * scaling;
    if accumulate {
        *ab = *ab + product;
    } else {
        *ab = product;
    }
}
