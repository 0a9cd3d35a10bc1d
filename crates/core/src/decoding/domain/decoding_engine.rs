use ndarray::{s, ArrayD};

use super::token_selector::{GreedySelector, TokenSelector};
use crate::inference::domain::inference_bridge::InferenceBridge;
use crate::shared::constants::MAX_DECODE_TOKENS;
use crate::text::domain::special_tokens::{TokenId, END_OF_TEXT};

/// Why the decode loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The decoder produced end-of-text.
    EndOfText,
    /// The generated sequence reached the token budget.
    Budget,
    /// A decoder call failed or returned unusable logits.
    InferenceFailed,
}

impl StopReason {
    pub const ALL: [StopReason; 3] = [
        StopReason::EndOfText,
        StopReason::Budget,
        StopReason::InferenceFailed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StopReason::EndOfText => "end_of_text",
            StopReason::Budget => "budget",
            StopReason::InferenceFailed => "inference_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Tokens produced after the seed, excluding end-of-text.
    pub generated: Vec<TokenId>,
    pub stop: StopReason,
}

/// Autoregressive decode loop: seed, step, terminate.
///
/// Each step feeds the full seed + generated sequence to the decoder and
/// selects the next token from the last position's logits. Decoder failures
/// end the loop early and keep whatever was generated.
pub struct DecodingEngine {
    max_tokens: usize,
    selector: Box<dyn TokenSelector>,
}

impl DecodingEngine {
    pub fn new(max_tokens: usize) -> Self {
        Self::with_selector(max_tokens, Box::new(GreedySelector))
    }

    pub fn with_selector(max_tokens: usize, selector: Box<dyn TokenSelector>) -> Self {
        Self {
            max_tokens,
            selector,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn decode(
        &self,
        bridge: &mut dyn InferenceBridge,
        hidden: &ArrayD<f32>,
        seed: Vec<TokenId>,
    ) -> DecodeOutcome {
        let seed_len = seed.len();
        let mut tokens = seed;

        let stop = loop {
            if tokens.len() - seed_len >= self.max_tokens {
                break StopReason::Budget;
            }
            let step = tokens.len() - seed_len;

            let logits = match bridge.run_decoder(&tokens, hidden) {
                Ok(logits) => logits,
                Err(e) => {
                    log::warn!("Decoder failed at step {step}, keeping partial output: {e}");
                    break StopReason::InferenceFailed;
                }
            };

            let (batch, positions, _) = logits.dim();
            let next = if batch > 0 && positions > 0 {
                self.selector.select(logits.slice(s![0, positions - 1, ..]))
            } else {
                None
            };
            let Some(next) = next else {
                log::warn!("Decoder returned empty logits at step {step}");
                break StopReason::InferenceFailed;
            };

            log::debug!("Decode step {step}: token {next}");
            if next == END_OF_TEXT {
                break StopReason::EndOfText;
            }
            tokens.push(next);
        };

        DecodeOutcome {
            generated: tokens.split_off(seed_len),
            stop,
        }
    }
}

impl Default for DecodingEngine {
    fn default() -> Self {
        Self::new(MAX_DECODE_TOKENS)
    }
}
