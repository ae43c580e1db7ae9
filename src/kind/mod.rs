//! Compile-time table mapping each supported value kind to its scalar type,
//! its transform domain and the engine's free functions.

use std::fmt::Debug;
use std::mem;

use num::{Complex, Float, Zero};
use rustfft::FftNum;

use crate::aligned;

pub mod simd;
pub mod size;

pub use simd::{simd_arch, simd_width};
pub use size::{good_size, is_power_of_two, is_valid_size, min_fft_size, next_power_of_two};

/// Whether the time/space-domain data is real or complex valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Real,
    Complex,
}

/// Sign of the transform exponent: `Forward` uses `exp(-2πi·kn/N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Floating point scalar the engine computes with.
pub trait FftScalar: FftNum + Float + Default {
    /// Nearest scalar to `len`, for scaling factors such as `1 / N`.
    fn from_len(len: usize) -> Self;
}

macro_rules! impl_fft_scalar {
    ($($t:ty),*) => {
        $(impl FftScalar for $t {
            #[inline]
            fn from_len(len: usize) -> Self {
                len as $t
            }
        })*
    };
}

impl_fft_scalar!(f32, f64);

/// The paired spectral type of a kind.
pub type ComplexOf<K> = Complex<<K as FftKind>::Scalar>;

/// A value kind accepted by [`crate::Fft`]: `f32`, `f64`, `Complex<f32>` or
/// `Complex<f64>`.
///
/// All associations are static; nothing here branches at runtime on the
/// kind.
pub trait FftKind: Copy + Zero + Debug + Send + Sync + 'static {
    type Scalar: FftScalar;

    const DOMAIN: Domain;

    /// Value and spectral elements have the same size for complex transforms.
    #[inline]
    fn is_complex_transform() -> bool {
        mem::size_of::<Self>() == mem::size_of::<ComplexOf<Self>>()
    }

    #[inline]
    fn is_float_scalar() -> bool {
        mem::size_of::<Self::Scalar>() == mem::size_of::<f32>()
    }

    #[inline]
    fn is_double_scalar() -> bool {
        mem::size_of::<Self::Scalar>() == mem::size_of::<f64>()
    }

    /// Number of scalars one value occupies in an interleaved buffer.
    #[inline]
    fn scalars_per_value() -> usize {
        mem::size_of::<Self>() / mem::size_of::<Self::Scalar>()
    }

    fn min_fft_size() -> usize {
        min_fft_size(Self::DOMAIN)
    }

    /// Panics when the result does not fit in `usize`.
    fn next_power_of_two(n: usize) -> usize {
        next_power_of_two(n)
    }

    fn is_power_of_two(n: usize) -> bool {
        is_power_of_two(n)
    }

    fn is_valid_size(n: usize) -> bool {
        is_valid_size(n, Self::DOMAIN)
    }

    fn good_size(n: usize) -> usize {
        good_size(n, Self::DOMAIN)
    }

    fn simd_width() -> usize {
        simd_width::<Self::Scalar>()
    }

    fn simd_arch() -> &'static str {
        simd_arch()
    }

    fn aligned_alloc(count: usize) -> *mut Self {
        aligned::aligned_alloc::<Self>(count)
    }

    /// # Safety
    ///
    /// See [`aligned::aligned_free`].
    unsafe fn aligned_free(ptr: *mut Self) {
        aligned::aligned_free(ptr)
    }
}

macro_rules! impl_fft_kind {
    ($($t:ty => $s:ty, $domain:expr);* $(;)?) => {
        $(impl FftKind for $t {
            type Scalar = $s;
            const DOMAIN: Domain = $domain;
        })*
    };
}

impl_fft_kind! {
    f32 => f32, Domain::Real;
    f64 => f64, Domain::Real;
    Complex<f32> => f32, Domain::Complex;
    Complex<f64> => f64, Domain::Complex;
}
