use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Magnitude spectrum of a single analysis frame.
///
/// Implementations return the first `size() / 2` bins. Frames shorter than
/// `size()` are treated as zero-padded.
pub trait FrameTransform {
    fn size(&self) -> usize;
    fn magnitude(&self, frame: &[f32]) -> Vec<f32>;
}

/// Hann window of length `n`
pub fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f32) / (n as f32 - 1.0)).cos()))
        .collect()
}

/// Iterative radix-2 Cooley-Tukey transform with precomputed tables.
#[derive(Clone, Debug)]
pub struct Radix2Fft {
    n: usize,
    rev: Vec<usize>,
    twiddles: Vec<Complex<f32>>,
}

impl Radix2Fft {
    /// Panics if `n` is not a power of two.
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two(), "FFT size must be a power of two, got {}", n);

        let mut rev = vec![0usize; n];
        let mut j = 0usize;
        for slot in rev.iter_mut() {
            *slot = j;
            let mut bit = n >> 1;
            while bit > 0 && j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j |= bit;
        }

        let twiddles = (0..n / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f32 / n as f32;
                Complex::new(angle.cos(), angle.sin())
            })
            .collect();

        Radix2Fft { n, rev, twiddles }
    }

    /// Full complex spectrum, in place over a bit-reversed copy of `frame`.
    pub fn spectrum(&self, frame: &[f32]) -> Vec<Complex<f32>> {
        let n = self.n;
        let mut buf: Vec<Complex<f32>> = self
            .rev
            .iter()
            .map(|&r| Complex::new(frame.get(r).copied().unwrap_or(0.0), 0.0))
            .collect();

        let mut m = 2;
        while m <= n {
            let half = m / 2;
            let step = n / m;
            for k in (0..n).step_by(m) {
                for j in 0..half {
                    let t = self.twiddles[j * step] * buf[k + j + half];
                    let u = buf[k + j];
                    buf[k + j] = u + t;
                    buf[k + j + half] = u - t;
                }
            }
            m <<= 1;
        }

        buf
    }
}

impl FrameTransform for Radix2Fft {
    fn size(&self) -> usize {
        self.n
    }

    fn magnitude(&self, frame: &[f32]) -> Vec<f32> {
        self.spectrum(frame)[..self.n / 2]
            .iter()
            .map(|c| c.norm())
            .collect()
    }
}

/// Same contract as [`Radix2Fft`], backed by a `rustfft` plan.
pub struct PlannedFft {
    n: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl PlannedFft {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        PlannedFft { n, fft }
    }
}

impl FrameTransform for PlannedFft {
    fn size(&self) -> usize {
        self.n
    }

    fn magnitude(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = (0..self.n)
            .map(|i| Complex::new(frame.get(i).copied().unwrap_or(0.0), 0.0))
            .collect();
        self.fft.process(&mut buffer);
        buffer[..self.n / 2].iter().map(|c| c.norm()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_endpoints() {
        let w = hann_window(1024);
        assert!(w[0].abs() < 1e-6);
        assert!(w[1023].abs() < 1e-6);
        assert!(w.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let fft = Radix2Fft::new(64);
        let mut frame = vec![0.0; 64];
        frame[0] = 1.0;
        let mag = fft.magnitude(&frame);
        assert_eq!(mag.len(), 32);
        assert!(mag.iter().all(|&m| (m - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let n = 1024;
        let fft = Radix2Fft::new(n);
        let frame: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 37.0 * i as f32 / n as f32).sin())
            .collect();
        let mag = fft.magnitude(&frame);
        let peak = mag
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 37);
        assert!((mag[37] - n as f32 / 2.0).abs() < 0.5);
    }

    #[test]
    fn test_matches_rustfft() {
        let n = 256;
        let frame: Vec<f32> = (0..n).map(|i| ((i * 7919) % 97) as f32 / 97.0 - 0.5).collect();
        let ours = Radix2Fft::new(n).magnitude(&frame);
        let theirs = PlannedFft::new(n).magnitude(&frame);
        for (a, b) in ours.iter().zip(theirs.iter()) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_short_frame_is_zero_padded() {
        let fft = Radix2Fft::new(16);
        let short = fft.magnitude(&[1.0, 0.5]);
        let padded = fft.magnitude(&[1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(short, padded);
    }

    #[test]
    #[should_panic]
    fn test_rejects_non_power_of_two() {
        Radix2Fft::new(1000);
    }
}
