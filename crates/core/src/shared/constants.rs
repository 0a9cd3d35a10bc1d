/// Audio sample rate the models were trained on (Hz).
pub const SAMPLE_RATE: u32 = 16000;

/// Fixed input window: every waveform is padded or truncated to this length.
pub const CHUNK_SECONDS: usize = 30;
pub const CHUNK_SAMPLES: usize = CHUNK_SECONDS * SAMPLE_RATE as usize;

/// STFT window length (25 ms at 16 kHz).
pub const N_FFT: usize = 400;
/// STFT hop length (10 ms at 16 kHz).
pub const HOP_LENGTH: usize = 160;
pub const N_MELS: usize = 80;

/// Frame count used when the encoder does not declare a concrete input width.
pub const DEFAULT_EXPECTED_FRAMES: usize = 3000;

pub const LOG_FLOOR: f64 = 1e-10;
pub const DYNAMIC_RANGE: f64 = 8.0;

/// Maximum number of tokens generated per transcription.
pub const MAX_DECODE_TOKENS: usize = 50;

pub const GENERATED_CONFIDENCE: f32 = 0.85;
pub const FALLBACK_CONFIDENCE: f32 = 0.60;

pub const ENCODER_FILENAME: &str = "encoder.onnx";
pub const DECODER_FILENAME: &str = "decoder.onnx";
pub const VOCAB_FILENAME: &str = "vocab.json";
pub const MERGES_FILENAME: &str = "merges.txt";

pub const MODEL_NAME: &str = "Whisper Tiny";
