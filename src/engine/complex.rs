use std::ptr;
use std::slice;
use std::sync::Arc;

use num::{Complex, Zero};
use rustfft::{Fft, FftPlanner};

use crate::kind::{Direction, FftScalar};

pub(super) struct ComplexPlan<S: FftScalar> {
    length: usize,
    forward: Arc<dyn Fft<S>>,
    inverse: Arc<dyn Fft<S>>,
    forward_scratch: Vec<Complex<S>>,
    inverse_scratch: Vec<Complex<S>>,
}

impl<S: FftScalar> ComplexPlan<S> {
    pub(super) fn new(length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(length);
        let inverse = planner.plan_fft_inverse(length);

        let forward_scratch = vec![Complex::zero(); forward.get_outofplace_scratch_len()];
        let inverse_scratch = vec![Complex::zero(); inverse.get_outofplace_scratch_len()];

        Self {
            length,
            forward,
            inverse,
            forward_scratch,
            inverse_scratch,
        }
    }

    /// The input is staged in `work` first, so `input` and `output` may
    /// alias.
    pub(super) unsafe fn process(
        &mut self,
        input: *const S,
        output: *mut S,
        work: *mut S,
        direction: Direction,
    ) {
        ptr::copy_nonoverlapping(input, work, 2 * self.length);

        let staged = slice::from_raw_parts_mut(work.cast::<Complex<S>>(), self.length);
        let output = slice::from_raw_parts_mut(output.cast::<Complex<S>>(), self.length);

        let (fft, scratch) = match direction {
            Direction::Forward => (&self.forward, &mut self.forward_scratch),
            Direction::Backward => (&self.inverse, &mut self.inverse_scratch),
        };
        fft.process_outofplace_with_scratch(staged, output, scratch);
    }
}
