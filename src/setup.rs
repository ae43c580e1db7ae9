use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::engine::EngineSetup;
use crate::error::FftError;
use crate::kind::{min_fft_size, Direction, FftKind};

/// Owner of exactly one engine setup for the kind `K`.
///
/// The wrapper is either empty or prepared for one length. Every
/// [`Setup::prepare_length`] call discards the current engine setup and
/// plans a new one, even for an unchanged length; [`crate::Fft`] is the
/// layer that skips redundant work.
pub struct Setup<K: FftKind> {
    engine: Option<EngineSetup<K::Scalar>>,
    _kind: PhantomData<K>,
}

impl<K: FftKind> Setup<K> {
    /// An empty wrapper.
    pub fn new() -> Self {
        Self {
            engine: None,
            _kind: PhantomData,
        }
    }

    /// Replaces the engine setup with one for `length`; `0` leaves the
    /// wrapper empty.
    ///
    /// On error the wrapper is empty.
    pub fn prepare_length(&mut self, length: usize) -> Result<(), FftError> {
        if let Some(old) = self.engine.take() {
            debug!(length = old.length(), "releasing engine setup");
        }
        if length == 0 {
            return Ok(());
        }

        let engine = EngineSetup::new(length, K::DOMAIN).ok_or(FftError::InvalidLength {
            length,
            domain: K::DOMAIN,
            min: min_fft_size(K::DOMAIN),
        })?;
        self.engine = Some(engine);
        Ok(())
    }

    /// Whether an engine setup is held.
    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.engine.is_some()
    }

    /// The prepared length, `0` when empty.
    #[inline]
    pub fn length(&self) -> usize {
        self.engine.as_ref().map_or(0, EngineSetup::length)
    }

    fn engine(&self) -> &EngineSetup<K::Scalar> {
        match &self.engine {
            Some(engine) => engine,
            None => panic!("FFT setup used before prepare_length"),
        }
    }

    fn engine_mut(&mut self) -> &mut EngineSetup<K::Scalar> {
        match &mut self.engine {
            Some(engine) => engine,
            None => panic!("FFT setup used before prepare_length"),
        }
    }

    /// # Safety
    ///
    /// See [`EngineSetup::transform_ordered`]. Panics when empty.
    pub unsafe fn transform_ordered(
        &mut self,
        input: *const K::Scalar,
        output: *mut K::Scalar,
        work: *mut K::Scalar,
        direction: Direction,
    ) {
        self.engine_mut()
            .transform_ordered(input, output, work, direction);
    }

    /// # Safety
    ///
    /// See [`EngineSetup::transform`]. Panics when empty.
    pub unsafe fn transform(
        &mut self,
        input: *const K::Scalar,
        output: *mut K::Scalar,
        work: *mut K::Scalar,
        direction: Direction,
    ) {
        self.engine_mut().transform(input, output, work, direction);
    }

    /// # Safety
    ///
    /// See [`EngineSetup::reorder`]. Panics when empty.
    pub unsafe fn reorder(
        &self,
        input: *const K::Scalar,
        output: *mut K::Scalar,
        direction: Direction,
    ) {
        self.engine().reorder(input, output, direction);
    }

    /// # Safety
    ///
    /// See [`EngineSetup::convolve`]. Panics when empty.
    pub unsafe fn convolve(
        &self,
        a: *const K::Scalar,
        b: *const K::Scalar,
        ab: *mut K::Scalar,
        scaling: K::Scalar,
    ) {
        self.engine().convolve(a, b, ab, scaling, false);
    }

    /// # Safety
    ///
    /// See [`EngineSetup::convolve`]. Panics when empty.
    pub unsafe fn convolve_accumulate(
        &self,
        a: *const K::Scalar,
        b: *const K::Scalar,
        ab: *mut K::Scalar,
        scaling: K::Scalar,
    ) {
        self.engine().convolve(a, b, ab, scaling, true);
    }
}

impl<K: FftKind> Default for Setup<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: FftKind> fmt::Debug for Setup<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use num::Complex;

    use super::*;
    use crate::kind::Domain;

    #[test]
    fn state_machine() {
        let mut setup = Setup::<f32>::new();
        assert!(!setup.is_prepared());
        assert_eq!(setup.length(), 0);

        setup.prepare_length(16).unwrap();
        assert!(setup.is_prepared());
        assert_eq!(setup.length(), 16);

        // same length again still replans
        setup.prepare_length(16).unwrap();
        assert_eq!(setup.length(), 16);

        setup.prepare_length(0).unwrap();
        assert!(!setup.is_prepared());

        setup.prepare_length(32).unwrap();
        assert_eq!(
            setup.prepare_length(7),
            Err(FftError::InvalidLength {
                length: 7,
                domain: Domain::Real,
                min: 2
            })
        );
        assert!(!setup.is_prepared());
    }

    #[test]
    #[should_panic(expected = "before prepare_length")]
    fn empty_setup_panics() {
        let mut setup = Setup::<Complex<f64>>::default();
        let mut data = [0.0f64; 4];
        let p = data.as_mut_ptr();
        unsafe { setup.transform(p, p, ptr::null_mut(), Direction::Forward) };
    }

    #[test]
    fn convolve_variants() {
        let mut setup = Setup::<Complex<f64>>::new();
        setup.prepare_length(1).unwrap();

        let a = [1.0, 1.0];
        let b = [2.0, 0.0];
        let mut ab = [1.0, 1.0];
        unsafe { setup.convolve_accumulate(a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), 1.0) };
        assert_eq!(ab, [3.0, 3.0]);
        unsafe { setup.convolve(a.as_ptr(), b.as_ptr(), ab.as_mut_ptr(), 1.0) };
        assert_eq!(ab, [2.0, 2.0]);
    }
}
