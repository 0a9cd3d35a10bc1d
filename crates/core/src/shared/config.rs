use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::constants::{DECODER_FILENAME, ENCODER_FILENAME, MAX_DECODE_TOKENS};
use super::error::ConfigError;
use crate::text::domain::tokenizer::Task;

/// Engine configuration, loadable from a JSON file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub model_dir: PathBuf,
    pub encoder_file: String,
    pub decoder_file: String,
    pub quantized: bool,
    pub intra_op_threads: usize,
    pub max_tokens: usize,
    pub task: Task,
    pub no_timestamps: bool,
    pub language: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            encoder_file: ENCODER_FILENAME.to_string(),
            decoder_file: DECODER_FILENAME.to_string(),
            quantized: true,
            intra_op_threads: 2,
            max_tokens: MAX_DECODE_TOKENS,
            task: Task::Transcribe,
            no_timestamps: true,
            language: "en".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Same configuration rooted at a different model directory.
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn encoder_path(&self) -> PathBuf {
        self.model_dir.join(&self.encoder_file)
    }

    pub fn decoder_path(&self) -> PathBuf {
        self.model_dir.join(&self.decoder_file)
    }
}

/// Platform data directory for model files.
///
/// - Linux: `$XDG_DATA_HOME/asr-engine/models/` or `~/.local/share/asr-engine/models/`
/// - macOS: `~/Library/Application Support/asr-engine/models/`
/// - Windows: `%APPDATA%/asr-engine/models/`
///
/// Falls back to `models` relative to the working directory.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("asr-engine").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_engine() {
        let config = EngineConfig::default();
        assert_eq!(config.encoder_file, "encoder.onnx");
        assert_eq!(config.decoder_file, "decoder.onnx");
        assert!(config.quantized);
        assert_eq!(config.intra_op_threads, 2);
        assert_eq!(config.max_tokens, 50);
        assert_eq!(config.task, Task::Transcribe);
        assert!(config.no_timestamps);
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_paths_join_model_dir() {
        let config = EngineConfig::default().with_model_dir("/opt/models");
        assert_eq!(config.encoder_path(), PathBuf::from("/opt/models/encoder.onnx"));
        assert_eq!(config.decoder_path(), PathBuf::from("/opt/models/decoder.onnx"));
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model_dir": "/srv/whisper", "task": "translate", "max_tokens": 10 }}"#
        )
        .unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/srv/whisper"));
        assert_eq!(config.task, Task::Translate);
        assert_eq!(config.max_tokens, 10);
        assert_eq!(config.encoder_file, "encoder.onnx");
        assert_eq!(config.language, "en");
    }

    #[test]
    fn test_from_file_missing_returns_read_error() {
        let err = EngineConfig::from_file(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_from_file_malformed_returns_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = EngineConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_serialize_round_trips_through_json() {
        let config = EngineConfig::default().with_model_dir("m");
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
