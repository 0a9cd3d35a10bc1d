//! Encoder/decoder inference through ONNX Runtime via `ort`.
//!
//! The encoder is bound positionally (first input, first output). Decoder
//! inputs are bound by name so that exports with different naming schemes
//! (`input_ids`/`tokens`, `encoder_hidden_states`/`hidden`) work unchanged.

use std::path::Path;

use ndarray::{Array3, ArrayD, Ix3};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue};
use ort::value::{Tensor, TensorRef};

use super::execution_provider::preferred_execution_providers;
use crate::inference::domain::inference_bridge::{
    token_tensor, InferenceBackend, InferenceBridge, SessionOptions,
};
use crate::shared::error::InferenceError;
use crate::text::domain::special_tokens::TokenId;

/// Which tensor a decoder input expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderInput {
    TokenIds,
    HiddenState,
}

/// Resolve a decoder input by substring of its lowercase name.
pub fn classify_decoder_input(name: &str) -> Option<DecoderInput> {
    let lower = name.to_lowercase();
    if lower.contains("token") || lower.contains("input_ids") {
        Some(DecoderInput::TokenIds)
    } else if lower.contains("encoder") || lower.contains("hidden") {
        Some(DecoderInput::HiddenState)
    } else {
        None
    }
}

/// Opens [`OnnxInferenceBridge`] sessions.
#[derive(Debug, Default)]
pub struct OnnxBackend;

impl InferenceBackend for OnnxBackend {
    fn name(&self) -> &str {
        "ONNX Runtime"
    }

    fn open(
        &self,
        encoder: &Path,
        decoder: &Path,
        options: SessionOptions,
    ) -> Result<Box<dyn InferenceBridge>, InferenceError> {
        Ok(Box::new(OnnxInferenceBridge::new(encoder, decoder, options)?))
    }
}

/// Whisper encoder/decoder pair backed by two ONNX Runtime sessions.
pub struct OnnxInferenceBridge {
    encoder: Session,
    decoder: Session,
    encoder_input: String,
    decoder_inputs: Vec<(String, DecoderInput)>,
    declared_frames: Option<usize>,
}

impl OnnxInferenceBridge {
    pub fn new(
        encoder_path: &Path,
        decoder_path: &Path,
        options: SessionOptions,
    ) -> Result<Self, InferenceError> {
        let encoder = open_session(encoder_path, options)?;
        let decoder = open_session(decoder_path, options)?;

        let encoder_input = encoder
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| InferenceError::Session {
                path: encoder_path.to_path_buf(),
                message: "encoder declares no inputs".to_string(),
            })?;

        // Encoder input is NCW: [1, n_mels, n_frames].
        let declared_frames = encoder.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 3 && shape[2] > 0 {
                    Some(shape[2] as usize)
                } else {
                    None
                }
            } else {
                None
            }
        });

        let decoder_inputs: Vec<(String, DecoderInput)> = decoder
            .inputs()
            .iter()
            .filter_map(|input| {
                let name = input.name().to_string();
                match classify_decoder_input(&name) {
                    Some(kind) => Some((name, kind)),
                    None => {
                        log::warn!("Leaving unrecognized decoder input '{name}' unbound");
                        None
                    }
                }
            })
            .collect();
        log::debug!("Decoder input binding: {decoder_inputs:?}");

        Ok(Self {
            encoder,
            decoder,
            encoder_input,
            decoder_inputs,
            declared_frames,
        })
    }
}

impl InferenceBridge for OnnxInferenceBridge {
    fn declared_frames(&self) -> Option<usize> {
        self.declared_frames
    }

    fn run_encoder(&mut self, features: Array3<f32>) -> Result<ArrayD<f32>, InferenceError> {
        let value = Tensor::from_array(features).map_err(run_error("encoder"))?;
        let outputs = self
            .encoder
            .run(ort::inputs![self.encoder_input.as_str() => value])
            .map_err(run_error("encoder"))?;
        if outputs.len() == 0 {
            return Err(InferenceError::Run {
                stage: "encoder",
                message: "model produced no outputs".to_string(),
            });
        }
        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .map_err(run_error("encoder"))?;
        Ok(hidden.to_owned())
    }

    fn run_decoder(
        &mut self,
        tokens: &[TokenId],
        hidden: &ArrayD<f32>,
    ) -> Result<Array3<f32>, InferenceError> {
        let mut inputs: Vec<(String, SessionInputValue<'_>)> =
            Vec::with_capacity(self.decoder_inputs.len());
        for (name, kind) in &self.decoder_inputs {
            let value: SessionInputValue<'_> = match kind {
                DecoderInput::TokenIds => Tensor::from_array(token_tensor(tokens))
                    .map_err(run_error("decoder"))?
                    .into(),
                DecoderInput::HiddenState => TensorRef::from_array_view(hidden.view())
                    .map_err(run_error("decoder"))?
                    .into(),
            };
            inputs.push((name.clone(), value));
        }

        let outputs = self.decoder.run(inputs).map_err(run_error("decoder"))?;
        if outputs.len() == 0 {
            return Err(InferenceError::Run {
                stage: "decoder",
                message: "model produced no outputs".to_string(),
            });
        }
        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(run_error("decoder"))?;
        let shape = logits.shape().to_vec();
        let logits = logits
            .into_dimensionality::<Ix3>()
            .map_err(|_| InferenceError::Shape {
                stage: "decoder",
                shape,
            })?;
        Ok(logits.to_owned())
    }
}

fn open_session(path: &Path, options: SessionOptions) -> Result<Session, InferenceError> {
    build_session(path, options).map_err(|e| InferenceError::Session {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn build_session(
    path: &Path,
    options: SessionOptions,
) -> Result<Session, Box<dyn std::error::Error>> {
    let (provider, providers) = preferred_execution_providers();
    log::debug!("Opening {} with {provider} execution provider", path.display());
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(options.intra_op_threads)?
        .with_execution_providers(providers)?
        .commit_from_file(path)?;
    Ok(session)
}

fn run_error<E: std::fmt::Display>(stage: &'static str) -> impl Fn(E) -> InferenceError {
    move |e| InferenceError::Run {
        stage,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::hf_ids("input_ids", Some(DecoderInput::TokenIds))]
    #[case::tokens("tokens", Some(DecoderInput::TokenIds))]
    #[case::upper("Decoder_Token_Input", Some(DecoderInput::TokenIds))]
    #[case::hf_hidden("encoder_hidden_states", Some(DecoderInput::HiddenState))]
    #[case::audio("audio_features_hidden", Some(DecoderInput::HiddenState))]
    #[case::encoder_out("encoder_output", Some(DecoderInput::HiddenState))]
    #[case::cache("past_key_values.0.key", None)]
    #[case::flag("use_cache_branch", None)]
    fn test_classify_decoder_input(#[case] name: &str, #[case] expected: Option<DecoderInput>) {
        assert_eq!(classify_decoder_input(name), expected);
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(OnnxBackend.name(), "ONNX Runtime");
    }

    #[test]
    fn test_open_nonexistent_model_returns_session_error() {
        let result = OnnxBackend.open(
            Path::new("/nonexistent/encoder.onnx"),
            Path::new("/nonexistent/decoder.onnx"),
            SessionOptions::default(),
        );
        match result {
            Err(InferenceError::Session { path, .. }) => {
                assert_eq!(path, Path::new("/nonexistent/encoder.onnx"));
            }
            Err(other) => panic!("expected session error, got {other}"),
            Ok(_) => panic!("expected session error"),
        }
    }

    #[test]
    #[ignore] // Requires Whisper Tiny ONNX exports in ./models
    fn test_real_models_report_encoder_frames() {
        let bridge = OnnxInferenceBridge::new(
            Path::new("models/encoder.onnx"),
            Path::new("models/decoder.onnx"),
            SessionOptions::default(),
        )
        .expect("Failed to open models");
        assert_eq!(bridge.declared_frames(), Some(3000));
    }

    #[test]
    #[ignore] // Requires Whisper Tiny ONNX exports in ./models
    fn test_real_models_reuse_hidden_state_across_steps() {
        use crate::text::domain::special_tokens::{START_OF_TRANSCRIPT, TRANSCRIBE};

        let mut bridge = OnnxInferenceBridge::new(
            Path::new("models/encoder.onnx"),
            Path::new("models/decoder.onnx"),
            SessionOptions::default(),
        )
        .expect("Failed to open models");
        let hidden = bridge
            .run_encoder(Array3::zeros((1, 80, 3000)))
            .expect("encoder run");

        let first = bridge
            .run_decoder(&[START_OF_TRANSCRIPT], &hidden)
            .expect("first step");
        let second = bridge
            .run_decoder(&[START_OF_TRANSCRIPT, TRANSCRIBE], &hidden)
            .expect("second step");
        assert_eq!(first.dim().1, 1);
        assert_eq!(second.dim().1, 2);
        assert_eq!(first.dim().2, second.dim().2);
    }
}
