//! Linear convolution built on [`Fft`]'s internal-layout spectra.

use ndarray::{Array1, ArrayBase, Data, Ix1};
use num::One;

use crate::error::FftError;
use crate::fft::Fft;
use crate::kind::{FftKind, FftScalar};

mod partitioned;

#[cfg(test)]
mod tests;

pub use partitioned::PartitionedConvolver;

/// Which part of the full linear convolution is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvMode {
    /// Every output sample, `signal + kernel - 1` of them.
    #[default]
    Full,
    /// The centred window with the length of the signal.
    Same,
    /// Only samples where signal and kernel overlap completely.
    Valid,
}

impl ConvMode {
    /// `(start, len)` of the window within the full result.
    pub(crate) fn window(self, signal: usize, kernel: usize) -> (usize, usize) {
        match self {
            ConvMode::Full => (0, signal + kernel - 1),
            ConvMode::Same => ((kernel - 1) / 2, signal),
            ConvMode::Valid => {
                let (short, long) = if signal < kernel {
                    (signal, kernel)
                } else {
                    (kernel, signal)
                };
                (short - 1, long - short + 1)
            }
        }
    }
}

/// One-shot FFT convolution of 1-D arrays.
pub trait ConvFftExt<K: FftKind> {
    /// Convolves `self` with `kernel` using a transform of
    /// [`FftKind::good_size`] of the full output length.
    fn conv_fft<S>(&self, kernel: &ArrayBase<S, Ix1>, mode: ConvMode) -> Result<Array1<K>, FftError>
    where
        S: Data<Elem = K>;
}

impl<K, T> ConvFftExt<K> for ArrayBase<T, Ix1>
where
    K: FftKind,
    T: Data<Elem = K>,
{
    fn conv_fft<S>(&self, kernel: &ArrayBase<S, Ix1>, mode: ConvMode) -> Result<Array1<K>, FftError>
    where
        S: Data<Elem = K>,
    {
        if self.is_empty() || kernel.is_empty() {
            return Err(FftError::EmptyInput);
        }

        let (start, len) = mode.window(self.len(), kernel.len());
        let length = K::good_size(self.len() + kernel.len() - 1);
        let mut fft = Fft::<K>::new(length)?;

        let mut signal = fft.value_vector();
        let mut padded_kernel = fft.value_vector();
        signal
            .iter_mut()
            .zip(self.iter())
            .for_each(|(dst, &src)| *dst = src);
        padded_kernel
            .iter_mut()
            .zip(kernel.iter())
            .for_each(|(dst, &src)| *dst = src);

        let mut signal_spectrum = fft.internal_layout_vector();
        let mut kernel_spectrum = fft.internal_layout_vector();
        let mut product = fft.internal_layout_vector();
        fft.forward_to_internal_layout(&signal, &mut signal_spectrum);
        fft.forward_to_internal_layout(&padded_kernel, &mut kernel_spectrum);

        let scaling = K::Scalar::one() / K::Scalar::from_len(length);
        fft.convolve(&signal_spectrum, &kernel_spectrum, &mut product, scaling);
        fft.inverse_from_internal_layout(&product, &mut signal);

        Ok(Array1::from(signal[start..start + len].to_vec()))
    }
}
