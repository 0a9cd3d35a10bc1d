use std::borrow::Cow;

use crate::shared::constants::SAMPLE_RATE;

/// Audio handed to the engine: mono 16 kHz, either normalized floats or raw PCM.
#[derive(Clone, Copy, Debug)]
pub enum AudioInput<'a> {
    /// Samples in approximately [-1.0, 1.0].
    Samples(&'a [f32]),
    /// Raw little-endian signed 16-bit PCM bytes.
    Pcm16(&'a [u8]),
}

/// Mono waveform at a fixed sample rate, borrowed from the caller when possible.
#[derive(Clone, Debug)]
pub struct Waveform<'a> {
    samples: Cow<'a, [f32]>,
    sample_rate: u32,
}

impl<'a> Waveform<'a> {
    pub fn new(samples: impl Into<Cow<'a, [f32]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Decode little-endian i16 PCM, scaling by 1/32768. A trailing odd byte is ignored.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32) -> Waveform<'static> {
        let samples: Vec<f32> = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect();
        Waveform::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds of the unpadded input.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

impl<'a> From<AudioInput<'a>> for Waveform<'a> {
    fn from(input: AudioInput<'a>) -> Self {
        match input {
            AudioInput::Samples(samples) => Waveform::new(samples, SAMPLE_RATE),
            AudioInput::Pcm16(bytes) => Waveform::from_pcm16_le(bytes, SAMPLE_RATE),
        }
    }
}
