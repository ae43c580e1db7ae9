//! Typed front end over a fixed-length FFT engine.
//!
//! [`Fft<K>`] transforms buffers of one value kind `K` (`f32`, `f64`,
//! `Complex<f32>` or `Complex<f64>`) of a fixed length. Besides the ordered
//! forward/inverse transforms it exposes the engine's internal spectral
//! layout, which skips a reordering pass and is what the frequency-domain
//! [`Fft::convolve`] and [`Fft::convolve_accumulate`] operate on.
//!
//! Buffers come from [`AlignedVec`] or the raw `aligned_alloc_*` helpers and
//! are aligned to [`SIMD_ALIGNMENT`] bytes.
//!
//! ```no_run
//! use aligned_fft::Fft;
//!
//! let mut fft = Fft::<f32>::new(1024)?;
//! let input = fft.value_vector();
//! let mut spectrum = fft.spectrum_vector();
//! fft.forward(&input, &mut spectrum);
//! # Ok::<(), aligned_fft::FftError>(())
//! ```

mod aligned;
mod conv;
mod engine;
mod error;
mod fft;
mod kind;
mod setup;

pub use aligned::{aligned_alloc, aligned_free, is_aligned, AlignedVec, SIMD_ALIGNMENT};
pub use conv::{ConvFftExt, ConvMode, PartitionedConvolver};
pub use engine::STACK_WORK_CAPACITY;
pub use error::FftError;
pub use fft::{Fft, DEFAULT_STACK_THRESHOLD, MAX_STACK_THRESHOLD};
pub use kind::{
    good_size, is_power_of_two, is_valid_size, min_fft_size, next_power_of_two, simd_arch,
    simd_width, ComplexOf, Direction, Domain, FftKind, FftScalar,
};
pub use setup::Setup;

pub use num::Complex;
