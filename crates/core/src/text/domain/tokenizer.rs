use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::languages::language_token;
use super::special_tokens::{
    is_special, TokenId, END_OF_TEXT, END_OF_TEXT_STR, NEWLINE_MARKER, NO_TIMESTAMPS,
    SPACE_MARKER, START_OF_TRANSCRIPT, TRANSCRIBE, TRANSLATE,
};
use super::vocabulary::{load_merges, MergePair, Vocabulary};
use crate::shared::constants::{MERGES_FILENAME, VOCAB_FILENAME};
use crate::shared::error::TokenizerError;

/// What the decoder is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    #[default]
    Transcribe,
    Translate,
}

impl Task {
    pub fn token(self) -> TokenId {
        match self {
            Task::Transcribe => TRANSCRIBE,
            Task::Translate => TRANSLATE,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Transcribe => write!(f, "transcribe"),
            Task::Translate => write!(f, "translate"),
        }
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcribe" => Ok(Task::Transcribe),
            "translate" => Ok(Task::Translate),
            other => Err(format!("unknown task '{other}' (expected transcribe or translate)")),
        }
    }
}

/// Whisper byte-level tokenizer with the fixed special-token layout.
///
/// `encode` is a per-character lookup, not merge-based BPE: merges are loaded
/// but never applied, and the resulting ids are relied on as-is.
#[derive(Clone, Debug, Default)]
pub struct Tokenizer {
    vocab: Vocabulary,
    merges: Vec<MergePair>,
}

impl Tokenizer {
    pub fn new(vocab: Vocabulary, merges: Vec<MergePair>) -> Self {
        Self { vocab, merges }
    }

    /// Load `vocab.json` and `merges.txt` from a model directory. Missing files
    /// produce empty tables.
    pub fn load(model_dir: &Path) -> Result<Self, TokenizerError> {
        let vocab = Vocabulary::load(&model_dir.join(VOCAB_FILENAME))?;
        let merges = load_merges(&model_dir.join(MERGES_FILENAME))?;
        Ok(Self::new(vocab, merges))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn merges(&self) -> &[MergePair] {
        &self.merges
    }

    /// Map each character through the vocabulary; unknown characters become end-of-text.
    pub fn encode(&self, text: &str) -> Vec<TokenId> {
        let unknown = self.vocab.id(END_OF_TEXT_STR).unwrap_or(END_OF_TEXT);
        let mut buf = [0u8; 4];
        text.chars()
            .map(|c| self.vocab.id(c.encode_utf8(&mut buf)).unwrap_or(unknown))
            .collect()
    }

    /// Reconstruct text from token ids.
    ///
    /// With `skip_special`, ids at or above start-of-transcript are dropped and
    /// end-of-text stops decoding. Unknown ids contribute nothing.
    pub fn decode(&self, ids: &[TokenId], skip_special: bool) -> String {
        let mut text = String::new();
        for &id in ids {
            if skip_special {
                if is_special(id) {
                    continue;
                }
                if id == END_OF_TEXT {
                    break;
                }
            }
            if let Some(token) = self.vocab.token(id) {
                text.push_str(token);
            }
        }

        text.replace(SPACE_MARKER, " ")
            .replace(NEWLINE_MARKER, "\n")
            .trim()
            .to_string()
    }

    pub fn language_token(&self, code: &str) -> TokenId {
        language_token(code)
    }

    /// Decoder prompt: start-of-transcript, language, task, then optionally no-timestamps.
    pub fn build_decoder_seed(&self, language: &str, task: Task, no_timestamps: bool) -> Vec<TokenId> {
        let mut seed = vec![START_OF_TRANSCRIPT, language_token(language), task.token()];
        if no_timestamps {
            seed.push(NO_TIMESTAMPS);
        }
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::domain::languages::LANGUAGE_CODES;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::fs;

    fn tokenizer() -> Tokenizer {
        let map: HashMap<String, TokenId> = [
            ("h", 71),
            ("i", 72),
            ("Ġ", 220),
            ("Hello", 15496),
            ("Ġworld", 995),
            ("Ċ", 198),
            ("!", 0),
            ("<|endoftext|>", END_OF_TEXT),
        ]
        .into_iter()
        .map(|(t, id)| (t.to_string(), id))
        .collect();
        Tokenizer::new(Vocabulary::from_map(map), Vec::new())
    }

    #[test]
    fn test_decode_replaces_markers_and_trims() {
        let tok = tokenizer();
        assert_eq!(tok.decode(&[220, 15496, 995, 0, 198], true), "Hello world!");
    }

    #[test]
    fn test_decode_keeps_inner_newline() {
        let tok = tokenizer();
        assert_eq!(tok.decode(&[15496, 198, 71, 72], true), "Hello\nhi");
    }

    #[test]
    fn test_decode_stops_at_mid_sequence_end_of_text() {
        let tok = tokenizer();
        assert_eq!(tok.decode(&[15496, END_OF_TEXT, 995, 71], true), "Hello");
    }

    #[test]
    fn test_decode_without_skip_resolves_everything() {
        let tok = tokenizer();
        assert_eq!(
            tok.decode(&[15496, END_OF_TEXT, 995], false),
            "Hello<|endoftext|> world"
        );
    }

    #[test]
    fn test_decode_drops_special_and_unknown_ids() {
        let tok = tokenizer();
        assert_eq!(
            tok.decode(&[START_OF_TRANSCRIPT, 71, 99999, 72, TRANSCRIBE], true),
            "hi"
        );
    }

    #[rstest]
    #[case::transcribe_no_ts(Task::Transcribe, true)]
    #[case::transcribe_ts(Task::Transcribe, false)]
    #[case::translate_no_ts(Task::Translate, true)]
    fn test_seed_decodes_to_empty_for_every_language(#[case] task: Task, #[case] no_ts: bool) {
        let tok = tokenizer();
        for code in LANGUAGE_CODES.iter().copied().chain(["xx", ""]) {
            let seed = tok.build_decoder_seed(code, task, no_ts);
            assert_eq!(tok.decode(&seed, true), "", "language {code}");
        }
    }

    #[test]
    fn test_seed_order() {
        let tok = tokenizer();
        assert_eq!(
            tok.build_decoder_seed("hi", Task::Transcribe, true),
            vec![START_OF_TRANSCRIPT, 50276, TRANSCRIBE, NO_TIMESTAMPS]
        );
        assert_eq!(
            tok.build_decoder_seed("de", Task::Translate, false),
            vec![START_OF_TRANSCRIPT, 50261, TRANSLATE]
        );
    }

    #[test]
    fn test_encode_is_per_character_lookup() {
        let tok = tokenizer();
        assert_eq!(tok.encode("hi!"), vec![71, 72, 0]);
    }

    #[test]
    fn test_encode_does_not_merge_known_words() {
        // "Hello" is a single vocabulary entry but encode never applies merges.
        let tok = tokenizer();
        let ids = tok.encode("Hello");
        assert_eq!(ids.len(), 5);
        assert!(!ids.contains(&15496));
    }

    #[test]
    fn test_encode_unknown_character_is_end_of_text() {
        let tok = tokenizer();
        assert_eq!(tok.encode("h€"), vec![71, END_OF_TEXT]);
        assert_eq!(Tokenizer::default().encode("a"), vec![END_OF_TEXT]);
    }

    #[test]
    fn test_language_token_delegates_to_table() {
        let tok = Tokenizer::default();
        assert_eq!(tok.language_token("zh"), 50260);
        assert_eq!(tok.language_token("klingon"), 50259);
    }

    #[test]
    fn test_load_from_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vocab.json"), r#"{"a": 64, "b": 65}"#).unwrap();
        fs::write(dir.path().join("merges.txt"), "#version: 0.2\na b\n").unwrap();

        let tok = Tokenizer::load(dir.path()).unwrap();
        assert_eq!(tok.vocabulary().len(), 2);
        assert_eq!(tok.merges().len(), 1);
        assert_eq!(tok.decode(&[64, 65], true), "ab");
    }

    #[test]
    fn test_load_empty_dir_degrades_to_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let tok = Tokenizer::load(dir.path()).unwrap();
        assert!(tok.vocabulary().is_empty());
        assert!(tok.merges().is_empty());
        assert_eq!(tok.decode(&[64, 65], true), "");
    }

    #[rstest]
    #[case("transcribe", Task::Transcribe)]
    #[case("translate", Task::Translate)]
    fn test_task_parses(#[case] s: &str, #[case] expected: Task) {
        assert_eq!(s.parse::<Task>().unwrap(), expected);
        assert_eq!(expected.to_string(), s);
    }

    #[test]
    fn test_task_rejects_unknown() {
        assert!("summarize".parse::<Task>().is_err());
    }
}
