use ndarray::ArrayView1;

use crate::text::domain::special_tokens::TokenId;

/// Picks the next token from the logits at the last decoder position.
pub trait TokenSelector: Send {
    fn select(&self, logits: ArrayView1<'_, f32>) -> Option<TokenId>;
}

/// Argmax selection. Ties resolve to the lowest id; NaN scores never win.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySelector;

impl TokenSelector for GreedySelector {
    fn select(&self, logits: ArrayView1<'_, f32>) -> Option<TokenId> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &score) in logits.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i as TokenId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rstest::rstest;

    #[rstest]
    #[case::simple(vec![0.1, 2.0, -1.0], Some(1))]
    #[case::first_wins_tie(vec![3.0, 1.0, 3.0], Some(0))]
    #[case::all_negative(vec![-5.0, -0.5, -2.0], Some(1))]
    #[case::nan_skipped(vec![f32::NAN, 0.2, 0.1], Some(1))]
    #[case::all_nan(vec![f32::NAN, f32::NAN], None)]
    #[case::empty(vec![], None)]
    fn test_greedy(#[case] logits: Vec<f32>, #[case] expected: Option<TokenId>) {
        assert_eq!(GreedySelector.select(arr1(&logits).view()), expected);
    }
}
