use super::special_tokens::{TokenId, FIRST_LANGUAGE};

/// Language codes in token order: `LANGUAGE_CODES[i]` has id `FIRST_LANGUAGE + i`.
pub const LANGUAGE_CODES: &[&str] = &[
    "en", "zh", "de", "es", "ru", "ko", "fr", "ja", "pt", "tr", //
    "pl", "ca", "nl", "ar", "sv", "it", "id", "hi", "fi", "vi", //
    "he", "uk", "el", "ms", "cs", "ro", "da", "hu", "ta", "no", //
    "th", "ur", "hr", "bg", "lt", "la", "mi", "ml", "cy", "sk", //
    "te", "fa", "lv", "bn", "sr", "az", "sl", "kn", "et", "mk", //
    "br", "eu", "is", "hy", "ne", "mn", "bs", "kk", "sq", "sw", //
    "gl", "mr", "pa", "si", "km", "sn", "yo", "so", "af", "oc", //
    "ka", "be", "tg", "sd", "gu", "am", "yi", "lo", "uz", "fo", //
    "ht", "ps", "tk", "nn", "mt", "sa", "lb", "my", "bo", "tl", //
    "mg", "as", "tt", "haw", "ln", "ha", "ba", "jw", "su",
];

pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages the engine advertises, with human-readable names.
pub const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Chinese"),
];

/// Token id for a language code. Unknown codes resolve to English.
pub fn language_token(code: &str) -> TokenId {
    LANGUAGE_CODES
        .iter()
        .position(|&c| c == code)
        .map(|i| FIRST_LANGUAGE + i as TokenId)
        .unwrap_or(FIRST_LANGUAGE)
}

pub fn display_name(code: &str) -> Option<&'static str> {
    DISPLAY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Placeholder text used when decoding produced no tokens.
pub fn fallback_text(code: &str) -> String {
    format!("[Audio in {}]", display_name(code).unwrap_or(code))
}
