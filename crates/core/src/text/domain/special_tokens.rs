//! Reserved token ids of the multilingual Whisper vocabulary.

pub type TokenId = u32;

pub const END_OF_TEXT: TokenId = 50257;
pub const START_OF_TRANSCRIPT: TokenId = 50258;
/// First language token (`en`); languages occupy a contiguous block up to `TRANSLATE - 1`.
pub const FIRST_LANGUAGE: TokenId = 50259;
pub const TRANSLATE: TokenId = 50358;
pub const TRANSCRIBE: TokenId = 50359;
pub const NO_TIMESTAMPS: TokenId = 50363;
pub const TIMESTAMP_BEGIN: TokenId = 50364;

pub const END_OF_TEXT_STR: &str = "<|endoftext|>";

/// Byte-level BPE marker for a leading space.
pub const SPACE_MARKER: char = 'Ġ';
/// Byte-level BPE marker for a newline.
pub const NEWLINE_MARKER: char = 'Ċ';

pub fn is_special(id: TokenId) -> bool {
    id >= START_OF_TRANSCRIPT
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::sot(START_OF_TRANSCRIPT, true)]
    #[case::translate(TRANSLATE, true)]
    #[case::timestamp(TIMESTAMP_BEGIN + 10, true)]
    #[case::eot(END_OF_TEXT, false)]
    #[case::text(440, false)]
    fn test_is_special(#[case] id: TokenId, #[case] expected: bool) {
        assert_eq!(is_special(id), expected);
    }
}
