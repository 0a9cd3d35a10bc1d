use std::collections::{BTreeMap, HashMap};

use crate::decoding::domain::decoding_engine::StopReason;

/// Observer for transcription events.
///
/// Keeps the service free of any particular output mechanism; the CLI logs
/// a summary, tests and embedders usually discard everything.
pub trait PipelineLogger: Send {
    /// Batch progress (`current` of `total` inputs finished).
    fn progress(&mut self, current: usize, total: usize);

    /// Time spent in one stage (`features`, `encoder`, `decoder`) for one input.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    /// Engine lifecycle message, e.g. what `load` opened.
    fn info(&mut self, message: &str);

    /// One input finished: seconds of audio, wall-clock cost, and why decoding stopped.
    fn transcribed(&mut self, audio_seconds: f64, processing_ms: f64, stop: StopReason);

    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn transcribed(&mut self, _audio_seconds: f64, _processing_ms: f64, _stop: StopReason) {}
}

/// Running count and sum of a series.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Tally {
    count: usize,
    sum: f64,
}

impl Tally {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates engine events into a run summary sent through `log`.
///
/// Batch progress is logged every `throttle_items` inputs and on the last one.
pub struct StdoutPipelineLogger {
    throttle_items: usize,
    stages: BTreeMap<String, Tally>,
    metrics: BTreeMap<String, Tally>,
    stops: HashMap<StopReason, usize>,
    audio_seconds: f64,
    processing_ms: f64,
    inputs: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_items: usize) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            stops: HashMap::new(),
            audio_seconds: 0.0,
            processing_ms: 0.0,
            inputs: 0,
        }
    }

    /// Processing time divided by audio time over every finished input.
    ///
    /// Below 1.0 means faster than real time. `None` until some audio was seen.
    pub fn real_time_factor(&self) -> Option<f64> {
        (self.audio_seconds > 0.0).then(|| self.processing_ms / 1000.0 / self.audio_seconds)
    }

    pub fn stop_count(&self, reason: StopReason) -> usize {
        self.stops.get(&reason).copied().unwrap_or(0)
    }

    /// Average milliseconds per call for `stage`.
    pub fn stage_avg_ms(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(Tally::avg)
    }

    pub fn metric_avg(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Tally::avg)
    }

    /// The rendered summary, or `None` before the first finished input.
    pub fn summary_string(&self) -> Option<String> {
        if self.inputs == 0 {
            return None;
        }

        let mut lines = vec![format!(
            "Transcribed {} input(s), {:.1}s of audio in {:.1}s",
            self.inputs,
            self.audio_seconds,
            self.processing_ms / 1000.0
        )];

        for (stage, tally) in &self.stages {
            lines.push(format!(
                "  {stage:10} avg {:7.1}ms over {} call(s)",
                tally.avg(),
                tally.count
            ));
        }
        for (name, tally) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}", tally.avg()));
        }

        let stops: Vec<String> = StopReason::ALL
            .iter()
            .map(|&r| format!("{} {}", r.label(), self.stop_count(r)))
            .collect();
        lines.push(format!("  stopped on: {}", stops.join(", ")));

        if let Some(rtf) = self.real_time_factor() {
            lines.push(format!("  real-time factor: {rtf:.3}"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        if current % self.throttle_items == 0 || current == total {
            log::info!("Batch progress: {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages.entry(stage.to_string()).or_default().add(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().add(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn transcribed(&mut self, audio_seconds: f64, processing_ms: f64, stop: StopReason) {
        self.inputs += 1;
        self.audio_seconds += audio_seconds;
        self.processing_ms += processing_ms;
        *self.stops.entry(stop).or_insert(0) += 1;
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
