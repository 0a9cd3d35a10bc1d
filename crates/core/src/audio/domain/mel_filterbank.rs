use ndarray::Array2;

pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank of shape `[n_mels, n_fft / 2 + 1]`, built analytically.
///
/// Filter edges are `n_mels + 2` points evenly spaced on the mel scale between
/// 0 Hz and Nyquist, snapped to FFT bins with `floor((n_fft + 1) * hz / sample_rate)`.
/// Each filter ramps linearly from 0 at its left edge to 1 at its center bin, and
/// back down towards its right edge.
#[derive(Clone, Debug)]
pub struct MelFilterbank {
    weights: Array2<f64>,
}

impl MelFilterbank {
    pub fn new(n_fft: usize, n_mels: usize, sample_rate: u32) -> Self {
        let n_bins = n_fft / 2 + 1;
        let sr = sample_rate as f64;
        let mel_min = hz_to_mel(0.0);
        let mel_max = hz_to_mel(sr / 2.0);

        let n_points = n_mels + 2;
        let step = (mel_max - mel_min) / (n_points - 1) as f64;
        let bins: Vec<usize> = (0..n_points)
            .map(|i| {
                let hz = mel_to_hz(mel_min + step * i as f64);
                ((n_fft + 1) as f64 * hz / sr).floor() as usize
            })
            .collect();

        let mut weights = Array2::<f64>::zeros((n_mels, n_bins));
        for m in 0..n_mels {
            let (left, center, right) = (bins[m], bins[m + 1], bins[m + 2]);
            for j in left..center.min(n_bins) {
                weights[[m, j]] = (j - left) as f64 / (center - left) as f64;
            }
            for j in center..right.min(n_bins) {
                weights[[m, j]] = (right - j) as f64 / (right - center) as f64;
            }
        }

        Self { weights }
    }

    pub fn n_mels(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_bins(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Project a power spectrogram `[n_bins, n_frames]` onto the mel bands.
    pub fn apply(&self, power: &Array2<f64>) -> Array2<f64> {
        self.weights.dot(power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{N_FFT, N_MELS, SAMPLE_RATE};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn whisper_bank() -> MelFilterbank {
        MelFilterbank::new(N_FFT, N_MELS, SAMPLE_RATE)
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::a440(440.0)]
    #[case::khz(1000.0)]
    #[case::nyquist(8000.0)]
    fn test_mel_conversion_inverts(#[case] hz: f64) {
        assert_relative_eq!(mel_to_hz(hz_to_mel(hz)), hz, epsilon = 1e-9);
    }

    #[test]
    fn test_1000_hz_is_about_1000_mel() {
        assert_relative_eq!(hz_to_mel(1000.0), 1000.0, epsilon = 0.1);
    }

    #[test]
    fn test_shape() {
        let bank = whisper_bank();
        assert_eq!(bank.n_mels(), 80);
        assert_eq!(bank.n_bins(), 201);
    }

    #[test]
    fn test_weights_bounded_in_unit_interval() {
        let bank = whisper_bank();
        assert!(bank.weights().iter().all(|&w| (0.0..=1.0).contains(&w)));
    }

    #[test]
    fn test_high_filters_peak_at_one() {
        // Upper filters are wide enough that the center bin is distinct from the left edge.
        let bank = whisper_bank();
        for m in 50..80 {
            let peak = bank.weights().row(m).iter().cloned().fold(0.0, f64::max);
            assert_relative_eq!(peak, 1.0);
        }
    }

    #[test]
    fn test_filters_move_upward_in_frequency() {
        let bank = whisper_bank();
        let first_nonzero = |m: usize| bank.weights().row(m).iter().position(|&w| w > 0.0);
        let low = first_nonzero(40).unwrap();
        let high = first_nonzero(79).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_apply_projects_power() {
        let bank = whisper_bank();
        let power = Array2::<f64>::ones((bank.n_bins(), 3));
        let mel = bank.apply(&power);
        assert_eq!(mel.dim(), (80, 3));
        for m in 0..80 {
            let row_sum: f64 = bank.weights().row(m).sum();
            assert_relative_eq!(mel[[m, 0]], row_sum, epsilon = 1e-12);
            assert_relative_eq!(mel[[m, 2]], row_sum, epsilon = 1e-12);
        }
    }
}
