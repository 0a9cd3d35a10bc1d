use std::path::Path;

use ndarray::{Array2, Array3, ArrayD};

use crate::shared::error::InferenceError;
use crate::text::domain::special_tokens::TokenId;

/// Options passed to a backend when opening the encoder/decoder sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub intra_op_threads: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            intra_op_threads: 2,
        }
    }
}

/// Domain interface for the external encoder/decoder model pair.
///
/// Implementations own their sessions exclusively, hence `&mut self`.
pub trait InferenceBridge: Send {
    /// Frame count declared by the encoder's input shape, if concrete.
    fn declared_frames(&self) -> Option<usize>;

    /// Run the encoder on `[1, n_mels, n_frames]` features.
    fn run_encoder(&mut self, features: Array3<f32>) -> Result<ArrayD<f32>, InferenceError>;

    /// Run the decoder on `[1, seq_len]` token ids; returns `[1, seq_len, vocab]` logits.
    fn run_decoder(
        &mut self,
        tokens: &[TokenId],
        hidden: &ArrayD<f32>,
    ) -> Result<Array3<f32>, InferenceError>;
}

/// Factory that opens an [`InferenceBridge`] from model files.
pub trait InferenceBackend: Send {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    fn open(
        &self,
        encoder: &Path,
        decoder: &Path,
        options: SessionOptions,
    ) -> Result<Box<dyn InferenceBridge>, InferenceError>;
}

/// Token ids as the `[1, seq_len]` int64 tensor decoders expect.
pub fn token_tensor(tokens: &[TokenId]) -> Array2<i64> {
    Array2::from_shape_fn((1, tokens.len()), |(_, i)| tokens[i] as i64)
}
