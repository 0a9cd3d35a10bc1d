use serde::{Deserialize, Serialize};

/// A timed span of recognized text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f32,
}

/// Output of one transcription call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: String,
    pub confidence: f32,
    pub segments: Vec<Segment>,
    /// Wall-clock processing time.
    pub duration_ms: u64,
}

/// Static description of a transcription engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub model: String,
    pub backend: String,
    pub quantized: bool,
    pub sample_rate: u32,
    pub languages: Vec<String>,
    pub loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_to_payload_shape() {
        let result = TranscriptionResult {
            text: "hello".to_string(),
            language: "en".to_string(),
            confidence: 0.85,
            segments: vec![Segment {
                start: 0.0,
                end: 1.5,
                text: "hello".to_string(),
                confidence: 0.85,
            }],
            duration_ms: 12,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["language"], "en");
        assert_eq!(json["duration_ms"], 12);
        assert_eq!(json["segments"][0]["end"], 1.5);
        assert_eq!(json["segments"][0]["text"], "hello");
    }
}
