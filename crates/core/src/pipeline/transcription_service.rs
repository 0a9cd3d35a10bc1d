use std::path::Path;
use std::time::Instant;

use ndarray::Axis;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::transcript::{EngineInfo, Segment, TranscriptionResult};
use crate::audio::domain::feature_extractor::FeatureExtractor;
use crate::audio::domain::waveform::{AudioInput, Waveform};
use crate::decoding::domain::decoding_engine::DecodingEngine;
use crate::inference::domain::inference_bridge::{
    InferenceBackend, InferenceBridge, SessionOptions,
};
use crate::inference::infrastructure::onnx_bridge::OnnxBackend;
use crate::shared::config::EngineConfig;
use crate::shared::constants::{
    DEFAULT_EXPECTED_FRAMES, FALLBACK_CONFIDENCE, GENERATED_CONFIDENCE, MODEL_NAME, SAMPLE_RATE,
};
use crate::shared::error::TranscriptionError;
use crate::text::domain::languages::{fallback_text, DISPLAY_NAMES};
use crate::text::domain::tokenizer::Tokenizer;

/// Per-item outcome of [`TranscriptionService::transcribe_batch`].
pub type BatchItem = Result<TranscriptionResult, TranscriptionError>;

/// State that only exists after a successful [`TranscriptionService::load`].
struct LoadedEngine {
    bridge: Box<dyn InferenceBridge>,
    tokenizer: Tokenizer,
    extractor: FeatureExtractor,
}

/// Entry point: waveform in, transcription record out.
///
/// Owns its encoder/decoder sessions exclusively. Callers that need parallel
/// transcription load one service per concurrent stream.
pub struct TranscriptionService {
    config: EngineConfig,
    backend: Box<dyn InferenceBackend>,
    decoding: DecodingEngine,
    logger: Box<dyn PipelineLogger>,
    engine: Option<LoadedEngine>,
}

impl TranscriptionService {
    pub fn new(config: EngineConfig, backend: Box<dyn InferenceBackend>) -> Self {
        let decoding = DecodingEngine::new(config.max_tokens);
        Self {
            config,
            backend,
            decoding,
            logger: Box::new(NullPipelineLogger),
            engine: None,
        }
    }

    /// Service backed by ONNX Runtime.
    pub fn onnx(config: EngineConfig) -> Self {
        Self::new(config, Box::new(OnnxBackend))
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// Frame width fixed by the loaded encoder.
    pub fn expected_frames(&self) -> Option<usize> {
        self.engine.as_ref().map(|e| e.extractor.expected_frames())
    }

    /// Open both model sessions and the tokenizer, and read the encoder's frame width.
    pub fn load(&mut self) -> Result<(), TranscriptionError> {
        let encoder_path = self.config.encoder_path();
        let decoder_path = self.config.decoder_path();
        if !encoder_path.exists() {
            return Err(TranscriptionError::NotFound {
                kind: "encoder",
                path: encoder_path,
            });
        }
        if !decoder_path.exists() {
            return Err(TranscriptionError::NotFound {
                kind: "decoder",
                path: decoder_path,
            });
        }

        let options = SessionOptions {
            intra_op_threads: self.config.intra_op_threads,
        };
        let bridge = self.backend.open(&encoder_path, &decoder_path, options)?;

        let model_dir = encoder_path.parent().unwrap_or(Path::new("."));
        let tokenizer = Tokenizer::load(model_dir)?;

        let expected_frames = bridge.declared_frames().unwrap_or(DEFAULT_EXPECTED_FRAMES);
        self.logger.info(&format!(
            "Loaded {MODEL_NAME} ({}) from {}: {expected_frames} frames, {} vocabulary entries, budget {} tokens",
            self.backend.name(),
            model_dir.display(),
            tokenizer.vocabulary().len(),
            self.decoding.max_tokens()
        ));

        self.engine = Some(LoadedEngine {
            bridge,
            tokenizer,
            extractor: FeatureExtractor::new(expected_frames),
        });
        Ok(())
    }

    /// Transcribe one waveform.
    ///
    /// Decoder failures are absorbed: the result carries whatever text was
    /// generated, or a placeholder naming the language.
    pub fn transcribe(
        &mut self,
        audio: AudioInput<'_>,
        language: &str,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let start = Instant::now();
        let engine = self.engine.as_mut().ok_or(TranscriptionError::NotLoaded)?;
        let waveform = Waveform::from(audio);

        let t = Instant::now();
        let features = engine.extractor.extract(waveform.samples());
        self.logger.timing("features", elapsed_ms(t));

        let t = Instant::now();
        let hidden = engine.bridge.run_encoder(features.insert_axis(Axis(0)))?;
        self.logger.timing("encoder", elapsed_ms(t));

        let t = Instant::now();
        let seed = engine.tokenizer.build_decoder_seed(
            language,
            self.config.task,
            self.config.no_timestamps,
        );
        let outcome = self
            .decoding
            .decode(engine.bridge.as_mut(), &hidden, seed);
        self.logger.timing("decoder", elapsed_ms(t));
        self.logger
            .metric("generated_tokens", outcome.generated.len() as f64);

        let (text, confidence) = if outcome.generated.is_empty() {
            (fallback_text(language), FALLBACK_CONFIDENCE)
        } else {
            (
                engine.tokenizer.decode(&outcome.generated, true),
                GENERATED_CONFIDENCE,
            )
        };

        let processing_ms = elapsed_ms(start);
        log::debug!(
            "Transcribed {:.2}s of audio in {processing_ms:.0}ms ({} tokens, {})",
            waveform.duration(),
            outcome.generated.len(),
            outcome.stop.label()
        );
        self.logger
            .transcribed(waveform.duration(), processing_ms, outcome.stop);

        Ok(TranscriptionResult {
            segments: vec![Segment {
                start: 0.0,
                end: waveform.duration(),
                text: text.clone(),
                confidence,
            }],
            text,
            language: language.to_string(),
            confidence,
            duration_ms: processing_ms as u64,
        })
    }

    /// Transcribe each input independently, in order.
    ///
    /// A failing item yields an `Err` in its slot; the rest of the batch still runs.
    pub fn transcribe_batch(
        &mut self,
        inputs: &[AudioInput<'_>],
        language: &str,
    ) -> Result<Vec<BatchItem>, TranscriptionError> {
        if !self.is_loaded() {
            return Err(TranscriptionError::NotLoaded);
        }

        let total = inputs.len();
        let mut results = Vec::with_capacity(total);
        for (i, &input) in inputs.iter().enumerate() {
            let result = self.transcribe(input, language);
            if let Err(ref e) = result {
                log::warn!("Batch item {i} failed: {e}");
            }
            results.push(result);
            self.logger.progress(i + 1, total);
        }
        Ok(results)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            model: MODEL_NAME.to_string(),
            backend: self.backend.name().to_string(),
            quantized: self.config.quantized,
            sample_rate: SAMPLE_RATE,
            languages: DISPLAY_NAMES.iter().map(|(c, _)| c.to_string()).collect(),
            loaded: self.is_loaded(),
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
