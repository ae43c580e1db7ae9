use crate::kind::Domain;

/// Errors reported by the fallible parts of the crate.
///
/// Buffer size mismatches are not represented here: they are caller contract
/// violations and panic at the call site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FftError {
    /// The engine refused to create a setup for this length.
    #[error("invalid {domain:?} FFT length {length}: expected a multiple of {min} with only 2, 3 and 5 as prime factors")]
    InvalidLength {
        length: usize,
        domain: Domain,
        min: usize,
    },

    #[error("cannot convolve an empty signal or kernel")]
    EmptyInput,

    /// The requested stack threshold does not fit the call-frame buffer.
    #[error("stack threshold {threshold} exceeds the maximum of {max}")]
    StackThreshold { threshold: usize, max: usize },

    /// No valid transform of `2 * block_size` exists for the domain.
    #[error("block size {block_size} has no valid {domain:?} FFT length")]
    BlockSize { block_size: usize, domain: Domain },
}
