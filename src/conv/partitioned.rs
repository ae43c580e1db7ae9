use num::One;
use tracing::debug;

use crate::aligned::AlignedVec;
use crate::error::FftError;
use crate::fft::Fft;
use crate::kind::{FftKind, FftScalar};

/// Streaming convolution with a fixed kernel, uniformly partitioned
/// overlap-save.
///
/// The kernel is cut into `block_size` partitions whose spectra are kept in
/// the internal layout. Each input block is transformed once into a
/// frequency-domain delay line; the output spectrum is the sum of delay line
/// entries times kernel partitions, followed by a single inverse transform of
/// `2 * block_size` samples.
///
/// No latency is added: output block `n` depends on input blocks `0..=n`.
pub struct PartitionedConvolver<K: FftKind> {
    fft: Fft<K>,
    block_size: usize,
    kernel_spectra: Vec<AlignedVec<K::Scalar>>,
    delay_line: Vec<AlignedVec<K::Scalar>>,
    /// Delay line slot of the newest input spectrum.
    head: usize,
    /// Previous and current input block.
    window: AlignedVec<K>,
    spectrum: AlignedVec<K::Scalar>,
    output: AlignedVec<K>,
    scaling: K::Scalar,
}

impl<K: FftKind> PartitionedConvolver<K> {
    /// Fails when the kernel is empty or `2 * block_size` is not a valid
    /// transform length for `K`.
    pub fn new(kernel: &[K], block_size: usize) -> Result<Self, FftError> {
        if kernel.is_empty() {
            return Err(FftError::EmptyInput);
        }
        let fft_length = 2 * block_size;
        if block_size == 0 || !K::is_valid_size(fft_length) {
            return Err(FftError::BlockSize {
                block_size,
                domain: K::DOMAIN,
            });
        }

        let mut fft = Fft::<K>::new(fft_length)?;
        let mut padded = fft.value_vector();
        let kernel_spectra = kernel
            .chunks(block_size)
            .map(|partition| {
                padded.as_mut_slice().fill(K::zero());
                padded[..partition.len()].copy_from_slice(partition);
                let mut spectrum = fft.internal_layout_vector();
                fft.forward_to_internal_layout(&padded, &mut spectrum);
                spectrum
            })
            .collect::<Vec<_>>();
        let delay_line = (0..kernel_spectra.len())
            .map(|_| fft.internal_layout_vector())
            .collect();

        debug!(
            block_size,
            partitions = kernel_spectra.len(),
            "partitioned convolver created"
        );

        Ok(Self {
            window: fft.value_vector(),
            spectrum: fft.internal_layout_vector(),
            output: fft.value_vector(),
            scaling: K::Scalar::one() / K::Scalar::from_len(fft_length),
            fft,
            block_size,
            kernel_spectra,
            delay_line,
            head: 0,
        })
    }

    /// Samples per processed block and per kernel partition.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of kernel partitions.
    #[inline]
    pub fn partitions(&self) -> usize {
        self.kernel_spectra.len()
    }

    /// Transform length, twice the block size.
    #[inline]
    pub fn fft_length(&self) -> usize {
        self.fft.length()
    }

    /// Convolves the next stretch of the stream. `input` and `output` must
    /// have the same length, a multiple of [`Self::block_size`].
    #[track_caller]
    pub fn process(&mut self, input: &[K], output: &mut [K]) {
        assert!(
            input.len() == output.len(),
            "process: input has {} samples, output has {}",
            input.len(),
            output.len()
        );
        assert!(
            input.len() % self.block_size == 0,
            "process: {} samples is not a multiple of the block size {}",
            input.len(),
            self.block_size
        );

        for (block_in, block_out) in input
            .chunks_exact(self.block_size)
            .zip(output.chunks_exact_mut(self.block_size))
        {
            self.process_block(block_in, block_out);
        }
    }

    fn process_block(&mut self, input: &[K], output: &mut [K]) {
        let block = self.block_size;
        let partitions = self.kernel_spectra.len();

        self.window.copy_within(block.., 0);
        self.window[block..].copy_from_slice(input);

        self.head = (self.head + partitions - 1) % partitions;
        self.fft
            .forward_to_internal_layout(&self.window, &mut self.delay_line[self.head]);

        for (p, kernel) in self.kernel_spectra.iter().enumerate() {
            let input = &self.delay_line[(self.head + p) % partitions];
            if p == 0 {
                self.fft
                    .convolve(input, kernel, &mut self.spectrum, self.scaling);
            } else {
                self.fft
                    .convolve_accumulate(input, kernel, &mut self.spectrum, self.scaling);
            }
        }

        self.fft
            .inverse_from_internal_layout(&self.spectrum, &mut self.output);
        output.copy_from_slice(&self.output[block..]);
    }

    /// Clears the stream history; the kernel is kept.
    pub fn reset(&mut self) {
        self.window.as_mut_slice().fill(K::zero());
        for spectrum in &mut self.delay_line {
            spectrum.as_mut_slice().fill(num::Zero::zero());
        }
        self.head = 0;
    }
}

impl<K: FftKind> std::fmt::Debug for PartitionedConvolver<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionedConvolver")
            .field("block_size", &self.block_size)
            .field("partitions", &self.partitions())
            .field("fft", &self.fft)
            .finish()
    }
}
