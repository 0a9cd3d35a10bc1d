use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use serde_json::json;

use asr_engine_core::audio::domain::waveform::AudioInput;
use asr_engine_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use asr_engine_core::pipeline::transcription_service::TranscriptionService;
use asr_engine_core::shared::config::EngineConfig;
use asr_engine_core::text::domain::languages::LANGUAGE_CODES;
use asr_engine_core::text::domain::tokenizer::Task;

/// Speech-to-text for raw 16 kHz mono PCM16 audio.
#[derive(Parser)]
#[command(name = "asr-engine")]
struct Cli {
    /// Raw little-endian 16-bit PCM files (mono, 16 kHz).
    inputs: Vec<PathBuf>,

    /// JSON engine configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing encoder.onnx, decoder.onnx, vocab.json, merges.txt.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Language code (en, hi, ta, ...). Unknown codes decode as English.
    #[arg(long)]
    language: Option<String>,

    /// Decoder task: transcribe or translate.
    #[arg(long)]
    task: Option<Task>,

    /// Maximum tokens generated per input.
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Let the decoder emit timestamp tokens.
    #[arg(long)]
    timestamps: bool,

    /// Print engine information and exit.
    #[arg(long)]
    info: bool,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let mut service = TranscriptionService::onnx(config)
        .with_logger(Box::new(StdoutPipelineLogger::default()));

    if cli.info {
        if let Err(e) = service.load() {
            log::warn!("Model not loaded: {e}");
        }
        print_json(&serde_json::to_value(service.info())?, cli.pretty)?;
        return Ok(());
    }

    service.load()?;

    let buffers = cli
        .inputs
        .iter()
        .map(|path| {
            fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let inputs: Vec<AudioInput> = buffers.iter().map(|b| AudioInput::Pcm16(b)).collect();

    let language = service.config().language.clone();
    let results = service.transcribe_batch(&inputs, &language)?;
    let payload = results
        .into_iter()
        .map(|result| match result {
            Ok(r) => serde_json::to_value(r),
            Err(e) => Ok(json!({ "error": e.to_string() })),
        })
        .collect::<Result<Vec<_>, _>>()?;

    print_json(&serde_json::Value::Array(payload), cli.pretty)?;
    service.logger().summary();
    Ok(())
}

fn build_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    if let Some(task) = cli.task {
        config.task = task;
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.max_tokens = max_tokens;
    }
    if cli.timestamps {
        config.no_timestamps = false;
    }
    log::debug!("Engine config: {config:?}");
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.info && cli.inputs.is_empty() {
        return Err("At least one input file is required unless --info is used".into());
    }
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if cli.max_tokens == Some(0) {
        return Err("--max-tokens must be at least 1".into());
    }
    if let Some(language) = &cli.language {
        if !LANGUAGE_CODES.contains(&language.as_str()) {
            log::warn!("Unknown language '{language}', decoding as English");
        }
    }
    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), serde_json::Error> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
