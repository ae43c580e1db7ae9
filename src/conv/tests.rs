use ndarray::prelude::*;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use num::Complex;

use super::*;

const TOLERANCE_F32: f32 = 1e-4;
const TOLERANCE_F64: f64 = 1e-9;

/// Direct linear convolution, the trusted baseline.
fn direct<T>(signal: &[T], kernel: &[T]) -> Vec<T>
where
    T: Copy + num::Zero + std::ops::Mul<Output = T>,
{
    let mut out = vec![T::zero(); signal.len() + kernel.len() - 1];
    for (i, &x) in signal.iter().enumerate() {
        for (j, &h) in kernel.iter().enumerate() {
            out[i + j] = out[i + j] + x * h;
        }
    }
    out
}

fn assert_close_f64(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    actual
        .iter()
        .zip(expected)
        .enumerate()
        .for_each(|(idx, (a, e))| {
            assert!(
                (a - e).abs() < TOLERANCE_F64,
                "Mismatch at index {}: actual={:.10}, expected={:.10}",
                idx,
                a,
                e
            );
        });
}

fn assert_close_f32(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    actual
        .iter()
        .zip(expected)
        .enumerate()
        .for_each(|(idx, (a, e))| {
            assert!(
                (a - e).abs() < TOLERANCE_F32,
                "Mismatch at index {}: actual={:.6}, expected={:.6}",
                idx,
                a,
                e
            );
        });
}

mod modes {
    use super::*;

    #[test]
    fn windows() {
        assert_eq!(ConvMode::Full.window(10, 3), (0, 12));
        assert_eq!(ConvMode::Same.window(10, 3), (1, 10));
        assert_eq!(ConvMode::Same.window(10, 4), (1, 10));
        assert_eq!(ConvMode::Valid.window(10, 3), (2, 8));
        assert_eq!(ConvMode::Valid.window(3, 10), (2, 8));
        assert_eq!(ConvMode::Valid.window(5, 5), (4, 1));
        assert_eq!(ConvMode::default(), ConvMode::Full);
    }

    #[test]
    fn small_integers() {
        let signal = array![1.0f64, 2.0, 3.0];
        let kernel = array![0.0f64, 1.0, 0.5];

        let full = signal.conv_fft(&kernel, ConvMode::Full).unwrap();
        assert_close_f64(full.as_slice().unwrap(), &[0.0, 1.0, 2.5, 4.0, 1.5]);

        let same = signal.conv_fft(&kernel, ConvMode::Same).unwrap();
        assert_close_f64(same.as_slice().unwrap(), &[1.0, 2.5, 4.0]);

        let valid = signal.conv_fft(&kernel, ConvMode::Valid).unwrap();
        assert_close_f64(valid.as_slice().unwrap(), &[2.5]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let empty = Array1::<f32>::zeros(0);
        let kernel = array![1.0f32];
        assert_eq!(
            empty.conv_fft(&kernel, ConvMode::Full),
            Err(FftError::EmptyInput)
        );
        assert_eq!(
            kernel.conv_fft(&empty, ConvMode::Same),
            Err(FftError::EmptyInput)
        );
    }
}

mod vs_direct {
    use super::*;

    #[test]
    fn real_f64() {
        for (n, k) in [(1, 1), (7, 3), (64, 17), (100, 100), (3, 40)] {
            let signal = Array1::random(n, Uniform::new(-1f64, 1.));
            let kernel = Array1::random(k, Uniform::new(-1f64, 1.));
            let expected = direct(signal.as_slice().unwrap(), kernel.as_slice().unwrap());

            for mode in [ConvMode::Full, ConvMode::Same, ConvMode::Valid] {
                let (start, len) = mode.window(n, k);
                let got = signal.conv_fft(&kernel, mode).unwrap();
                assert_close_f64(got.as_slice().unwrap(), &expected[start..start + len]);
            }
        }
    }

    #[test]
    fn real_f32() {
        let signal = Array1::random(300, Uniform::new(-1f32, 1.));
        let kernel = Array1::random(31, Uniform::new(-1f32, 1.));
        let expected = direct(signal.as_slice().unwrap(), kernel.as_slice().unwrap());

        let got = signal.conv_fft(&kernel, ConvMode::Full).unwrap();
        assert_close_f32(got.as_slice().unwrap(), &expected);
    }

    #[test]
    fn complex() {
        let re = Array1::random(50, Uniform::new(-1f64, 1.));
        let im = Array1::random(50, Uniform::new(-1f64, 1.));
        let signal: Array1<Complex<f64>> = re
            .iter()
            .zip(&im)
            .map(|(&re, &im)| Complex::new(re, im))
            .collect();
        let kernel = array![
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 1.0),
            Complex::new(-0.5, 0.25)
        ];
        let expected = direct(signal.as_slice().unwrap(), kernel.as_slice().unwrap());

        let got = signal.conv_fft(&kernel, ConvMode::Full).unwrap();
        assert_eq!(got.len(), expected.len());
        for (idx, (g, e)) in got.iter().zip(&expected).enumerate() {
            assert!((g - e).norm() < TOLERANCE_F64, "Mismatch at index {idx}");
        }

        let complex_f32 = signal.mapv(|c| Complex::new(c.re as f32, c.im as f32));
        let got = complex_f32
            .conv_fft(&kernel.mapv(|c| Complex::new(c.re as f32, c.im as f32)), ConvMode::Same)
            .unwrap();
        for (idx, (g, e)) in got.iter().zip(&expected[1..51]).enumerate() {
            let diff = Complex::new(g.re as f64 - e.re, g.im as f64 - e.im);
            assert!(diff.norm() < TOLERANCE_F32 as f64, "Mismatch at index {idx}");
        }
    }

    #[test]
    fn strided_views() {
        let signal = Array1::random(40, Uniform::new(-1f64, 1.));
        let kernel = array![1.0f64, -2.0, 1.0];
        let view = signal.slice(s![..;2]);
        let expected = direct(&view.to_vec(), kernel.as_slice().unwrap());

        let got = view.conv_fft(&kernel.view(), ConvMode::Full).unwrap();
        assert_close_f64(got.as_slice().unwrap(), &expected);
    }
}

mod partitioned {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            PartitionedConvolver::<f32>::new(&[], 16).unwrap_err(),
            FftError::EmptyInput
        );
        assert_eq!(
            PartitionedConvolver::<f32>::new(&[1.0], 0).unwrap_err(),
            FftError::BlockSize {
                block_size: 0,
                domain: crate::Domain::Real
            }
        );
        assert_eq!(
            PartitionedConvolver::<Complex<f64>>::new(&[Complex::new(1.0, 0.0)], 7).unwrap_err(),
            FftError::BlockSize {
                block_size: 7,
                domain: crate::Domain::Complex
            }
        );
    }

    #[test]
    fn geometry() {
        let kernel = vec![0.5f64; 100];
        let convolver = PartitionedConvolver::new(&kernel, 32).unwrap();
        assert_eq!(convolver.block_size(), 32);
        assert_eq!(convolver.partitions(), 4);
        assert_eq!(convolver.fft_length(), 64);
    }

    #[test]
    fn stream_matches_direct() {
        let block = 16;
        let kernel = Array1::random(70, Uniform::new(-1f64, 1.)).to_vec();
        let input = Array1::random(block * 12, Uniform::new(-1f64, 1.)).to_vec();
        let expected = direct(&input, &kernel);

        let mut convolver = PartitionedConvolver::new(&kernel, block).unwrap();
        let mut output = vec![0.0; input.len()];
        // uneven call sizes, all multiples of the block
        let mut offset = 0;
        for blocks in [1, 3, 2, 6] {
            let range = offset..offset + blocks * block;
            convolver.process(&input[range.clone()], &mut output[range]);
            offset += blocks * block;
        }
        assert_close_f64(&output, &expected[..input.len()]);
    }

    #[test]
    fn kernel_shorter_than_block() {
        let kernel = [1.0f32, 0.5, 0.25];
        let input = Array1::random(80, Uniform::new(-1f32, 1.)).to_vec();
        let expected = direct(&input, &kernel);

        let mut convolver = PartitionedConvolver::new(&kernel, 20).unwrap();
        assert_eq!(convolver.partitions(), 1);
        let mut output = vec![0.0; 80];
        convolver.process(&input, &mut output);
        assert_close_f32(&output, &expected[..80]);
    }

    #[test]
    fn complex_stream_matches_direct() {
        let kernel: Vec<Complex<f64>> = (0..9)
            .map(|i| Complex::new(1.0 / (i + 1) as f64, i as f64 * 0.1))
            .collect();
        let input: Vec<Complex<f64>> = (0..60)
            .map(|i| Complex::new((i as f64 * 0.3).sin(), (i as f64 * 0.7).cos()))
            .collect();
        let expected = direct(&input, &kernel);

        let mut convolver = PartitionedConvolver::new(&kernel, 5).unwrap();
        let mut output = vec![Complex::new(0.0, 0.0); 60];
        convolver.process(&input, &mut output);
        for (idx, (g, e)) in output.iter().zip(&expected).enumerate() {
            assert!((g - e).norm() < TOLERANCE_F64, "Mismatch at index {idx}");
        }
    }

    #[test]
    fn reset_forgets_history() {
        let kernel = [0.25f64; 12];
        let mut convolver = PartitionedConvolver::new(&kernel, 4).unwrap();
        let impulse = [1.0, 0.0, 0.0, 0.0];

        let mut first = [0.0; 4];
        convolver.process(&impulse, &mut first);
        let mut tail = [0.0; 4];
        convolver.process(&[0.0; 4], &mut tail);
        assert_close_f64(&tail, &[0.25; 4]);

        convolver.reset();
        let mut again = [0.0; 4];
        convolver.process(&impulse, &mut again);
        assert_close_f64(&again, &first);
    }

    #[test]
    #[should_panic(expected = "not a multiple of the block size")]
    fn partial_block_panics() {
        let mut convolver = PartitionedConvolver::new(&[1.0f32], 8).unwrap();
        let mut output = [0.0f32; 5];
        convolver.process(&[0.0; 5], &mut output);
    }
}
