use std::ptr;
use std::slice;
use std::sync::Arc;

use num::{Complex, Zero};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::{multiply_pairs, multiply_scalar};
use crate::kind::{Direction, FftScalar};

pub(super) struct RealPlan<S: FftScalar> {
    length: usize,
    forward: Arc<dyn RealToComplex<S>>,
    inverse: Arc<dyn ComplexToReal<S>>,
    /// `length / 2 + 1` bins, DC and Nyquist included.
    spectrum: Vec<Complex<S>>,
    forward_scratch: Vec<Complex<S>>,
    inverse_scratch: Vec<Complex<S>>,
}

impl<S: FftScalar> RealPlan<S> {
    pub(super) fn new(length: usize) -> Self {
        let mut planner = RealFftPlanner::new();
        let forward = planner.plan_fft_forward(length);
        let inverse = planner.plan_fft_inverse(length);

        let spectrum = forward.make_output_vec();
        let forward_scratch = forward.make_scratch_vec();
        let inverse_scratch = inverse.make_scratch_vec();

        Self {
            length,
            forward,
            inverse,
            spectrum,
            forward_scratch,
            inverse_scratch,
        }
    }

    /// The input is fully consumed before the output is written, so `input`
    /// and `output` may alias.
    pub(super) unsafe fn process(
        &mut self,
        input: *const S,
        output: *mut S,
        work: *mut S,
        direction: Direction,
        ordered: bool,
    ) {
        let n = self.length;
        match direction {
            Direction::Forward => {
                // realfft uses its input as scratch space
                ptr::copy_nonoverlapping(input, work, n);
                let staged = slice::from_raw_parts_mut(work, n);

                let result = self.forward.process_with_scratch(
                    staged,
                    &mut self.spectrum,
                    &mut self.forward_scratch,
                );
                debug_assert!(result.is_ok(), "buffer lengths are fixed by the plan");

                pack(&self.spectrum, slice::from_raw_parts_mut(output, n), ordered);
            }
            Direction::Backward => {
                unpack(slice::from_raw_parts(input, n), &mut self.spectrum, ordered);

                let result = self.inverse.process_with_scratch(
                    &mut self.spectrum,
                    slice::from_raw_parts_mut(output, n),
                    &mut self.inverse_scratch,
                );
                debug_assert!(result.is_ok(), "buffer lengths are fixed by the plan");
            }
        }
    }

    pub(super) unsafe fn reorder(&self, input: *const S, output: *mut S, direction: Direction) {
        let n = self.length;
        let input = slice::from_raw_parts(input, n);
        let output = slice::from_raw_parts_mut(output, n);

        output[0] = input[0];
        match direction {
            Direction::Forward => {
                output[1] = input[n - 1];
                output[2..].copy_from_slice(&input[1..n - 1]);
            }
            Direction::Backward => {
                output[n - 1] = input[1];
                output[1..n - 1].copy_from_slice(&input[2..]);
            }
        }
    }
}

/// Writes the `n / 2 + 1` bins of `spectrum` into `n` scalars.
fn pack<S: FftScalar>(spectrum: &[Complex<S>], out: &mut [S], ordered: bool) {
    let n = out.len();
    let m = n / 2;

    out[0] = spectrum[0].re;
    let bins = if ordered {
        out[1] = spectrum[m].re;
        &mut out[2..]
    } else {
        out[n - 1] = spectrum[m].re;
        &mut out[1..n - 1]
    };
    for (pair, bin) in bins.chunks_exact_mut(2).zip(&spectrum[1..m]) {
        pair[0] = bin.re;
        pair[1] = bin.im;
    }
}

/// Inverse of [`pack`]. DC and Nyquist get an exact zero imaginary part.
fn unpack<S: FftScalar>(input: &[S], spectrum: &mut [Complex<S>], ordered: bool) {
    let n = input.len();
    let m = n / 2;

    let (nyquist, bins) = if ordered {
        (input[1], &input[2..])
    } else {
        (input[n - 1], &input[1..n - 1])
    };
    spectrum[0] = Complex::new(input[0], S::zero());
    spectrum[m] = Complex::new(nyquist, S::zero());
    for (bin, pair) in spectrum[1..m].iter_mut().zip(bins.chunks_exact(2)) {
        *bin = Complex::new(pair[0], pair[1]);
    }
}

/// Multiply(-accumulate) in the internal layout: DC and Nyquist are real,
/// everything in between is interleaved complex.
pub(super) unsafe fn convolve<S: FftScalar>(
    length: usize,
    a: *const S,
    b: *const S,
    ab: *mut S,
    scaling: S,
    accumulate: bool,
) {
    let last = length - 1;
    multiply_scalar(a, b, ab, scaling, accumulate);
    multiply_scalar(a.add(last), b.add(last), ab.add(last), scaling, accumulate);
    multiply_pairs(
        a.add(1),
        b.add(1),
        ab.add(1),
        length / 2 - 1,
        scaling,
        accumulate,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_layouts() {
        let spectrum = vec![
            Complex::new(10.0f64, 0.0),
            Complex::new(1.0, 2.0),
            Complex::new(3.0, 4.0),
            Complex::new(-6.0, 0.0),
        ];

        let mut ordered = vec![0.0; 6];
        pack(&spectrum, &mut ordered, true);
        assert_eq!(ordered, vec![10.0, -6.0, 1.0, 2.0, 3.0, 4.0]);

        let mut internal = vec![0.0; 6];
        pack(&spectrum, &mut internal, false);
        assert_eq!(internal, vec![10.0, 1.0, 2.0, 3.0, 4.0, -6.0]);

        let mut back = vec![Complex::new(9.0, 9.0); 4];
        unpack(&internal, &mut back, false);
        assert_eq!(back, spectrum);
        unpack(&ordered, &mut back, true);
        assert_eq!(back, spectrum);
    }

    #[test]
    fn reorder_both_ways() {
        let plan = RealPlan::<f32>::new(8);
        let internal = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut ordered = [0.0f32; 8];
        unsafe { plan.reorder(internal.as_ptr(), ordered.as_mut_ptr(), Direction::Forward) };
        assert_eq!(ordered, [0.0, 7.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut restored = [0.0f32; 8];
        unsafe { plan.reorder(ordered.as_ptr(), restored.as_mut_ptr(), Direction::Backward) };
        assert_eq!(restored, internal);
    }

    #[test]
    fn convolve_treats_dc_and_nyquist_as_real() {
        // [DC, Re1, Im1, Nyquist]
        let a = [2.0f64, 1.0, 1.0, 3.0];
        let b = [5.0f64, 0.0, 1.0, -1.0];
        let mut ab = [0.0f64; 4];
        unsafe { convolve(4, a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), 0.5, false) };
        // (1 + i) * i = -1 + i
        assert_eq!(ab, [5.0, -0.5, 0.5, -1.5]);

        unsafe { convolve(4, a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), 0.5, true) };
        assert_eq!(ab, [10.0, -1.0, 1.0, -3.0]);
    }
}
