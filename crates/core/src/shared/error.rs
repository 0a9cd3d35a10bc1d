use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an inference backend, independent of the runtime behind it.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("failed to open {path}: {message}")]
    Session { path: PathBuf, message: String },
    #[error("{stage} inference failed: {message}")]
    Run {
        stage: &'static str,
        message: String,
    },
    #[error("unexpected {stage} output shape: {shape:?}")]
    Shape {
        stage: &'static str,
        shape: Vec<usize>,
    },
}

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("{kind} not found: {path}")]
    NotFound { kind: &'static str, path: PathBuf },
    #[error("models not loaded; call load() first")]
    NotLoaded,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_kind_and_path() {
        let err = TranscriptionError::NotFound {
            kind: "encoder",
            path: PathBuf::from("/models/encoder.onnx"),
        };
        let msg = err.to_string();
        assert!(msg.contains("encoder not found"), "got: {msg}");
        assert!(msg.contains("/models/encoder.onnx"), "got: {msg}");
    }

    #[test]
    fn test_inference_error_converts_transparently() {
        let err: TranscriptionError = InferenceError::Run {
            stage: "encoder",
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "encoder inference failed: boom");
    }
}
