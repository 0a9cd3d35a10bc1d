use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{s, Array2};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::mel_filterbank::MelFilterbank;
use crate::shared::constants::{
    CHUNK_SAMPLES, DYNAMIC_RANGE, HOP_LENGTH, LOG_FLOOR, N_FFT, N_MELS, SAMPLE_RATE,
};

/// Converts a 16 kHz mono waveform into a `[80, expected_frames]` log-mel spectrogram.
///
/// The waveform is first fitted to exactly 30 seconds, so the output shape never
/// depends on the input length. Extraction is deterministic.
pub struct FeatureExtractor {
    expected_frames: usize,
    window: Vec<f64>,
    filterbank: MelFilterbank,
    fft: Arc<dyn Fft<f64>>,
}

impl FeatureExtractor {
    pub fn new(expected_frames: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            expected_frames,
            window: hann_window(N_FFT),
            filterbank: MelFilterbank::new(N_FFT, N_MELS, SAMPLE_RATE),
            fft: planner.plan_fft_forward(N_FFT),
        }
    }

    pub fn expected_frames(&self) -> usize {
        self.expected_frames
    }

    pub fn extract(&self, samples: &[f32]) -> Array2<f32> {
        let audio = pad_or_truncate(samples, CHUNK_SAMPLES);
        let power = self.power_spectrogram(&audio);
        let mut mel = self.filterbank.apply(&power);
        log_normalize(&mut mel);
        fit_frames(&mel.mapv(|v| v as f32), self.expected_frames)
    }

    /// Squared STFT magnitudes, `[n_fft / 2 + 1, n_frames]`.
    fn power_spectrogram(&self, audio: &[f32]) -> Array2<f64> {
        let n_bins = N_FFT / 2 + 1;
        let n_frames = if audio.len() >= N_FFT {
            1 + (audio.len() - N_FFT) / HOP_LENGTH
        } else {
            0
        };

        let mut power = Array2::<f64>::zeros((n_bins, n_frames));
        let mut buf = vec![Complex::new(0.0, 0.0); N_FFT];

        for frame in 0..n_frames {
            let start = frame * HOP_LENGTH;
            // Partial frames contribute nothing.
            if start + N_FFT > audio.len() {
                continue;
            }
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = Complex::new(audio[start + i] as f64 * self.window[i], 0.0);
            }
            self.fft.process(&mut buf);
            for (k, c) in buf.iter().take(n_bins).enumerate() {
                power[[k, frame]] = c.norm_sqr();
            }
        }

        power
    }
}

/// Symmetric Hann window: `0.5 - 0.5 cos(2πn / (N - 1))`.
fn hann_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / (len - 1) as f64).cos())
        .collect()
}

fn pad_or_truncate(samples: &[f32], len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; len];
    let n = samples.len().min(len);
    out[..n].copy_from_slice(&samples[..n]);
    out
}

/// log10 with a floor, clamp to `max - 8`, then scale with `(x + 4) / 4`.
fn log_normalize(mel: &mut Array2<f64>) {
    mel.mapv_inplace(|v| v.max(LOG_FLOOR).log10());
    let max = mel.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let floor = max - DYNAMIC_RANGE;
    mel.mapv_inplace(|v| (v.max(floor) + 4.0) / 4.0);
}

/// Zero-pad or truncate along the frame axis.
fn fit_frames(mel: &Array2<f32>, expected: usize) -> Array2<f32> {
    let (n_mels, n_frames) = mel.dim();
    let keep = n_frames.min(expected);
    let mut out = Array2::<f32>::zeros((n_mels, expected));
    out.slice_mut(s![.., ..keep])
        .assign(&mel.slice(s![.., ..keep]));
    out
}
