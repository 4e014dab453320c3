use std::collections::BTreeMap;

use crate::normalize::normalize;

/// Lexical similarity between two cleaned strings, in `[0, 1]`.
pub trait SimilarityModel {
    fn similarity(&self, candidate: &str, reference: &str) -> f64;
}

impl<M: SimilarityModel + ?Sized> SimilarityModel for &M {
    fn similarity(&self, candidate: &str, reference: &str) -> f64 {
        (**self).similarity(candidate, reference)
    }
}

/// Cosine similarity of TF-IDF vectors built over the two-document corpus
/// `{candidate, reference}`.
///
/// Tokens are whitespace-separated words of at least two characters. Term
/// weights are raw counts times the smoothed idf `ln((1 + n) / (1 + df)) + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfCosine;

const MIN_TOKEN_CHARS: usize = 2;

impl SimilarityModel for TfidfCosine {
    fn similarity(&self, candidate: &str, reference: &str) -> f64 {
        let left_counts = term_counts(candidate);
        let right_counts = term_counts(reference);
        if left_counts.is_empty() || right_counts.is_empty() {
            return 0.0;
        }

        let docs = 2.0_f64;
        let idf = |term: &str| {
            let df = [&left_counts, &right_counts]
                .iter()
                .filter(|counts| counts.contains_key(term))
                .count() as f64;
            ((1.0 + docs) / (1.0 + df)).ln() + 1.0
        };
        let weigh = |counts: &BTreeMap<&str, usize>| -> BTreeMap<String, f64> {
            counts
                .iter()
                .map(|(term, count)| (term.to_string(), *count as f64 * idf(*term)))
                .collect()
        };
        let left = weigh(&left_counts);
        let right = weigh(&right_counts);

        let dot: f64 = left
            .iter()
            .filter_map(|(term, weight)| right.get(term).map(|other| weight * other))
            .sum();
        let denom = l2_norm(&left) * l2_norm(&right);
        if denom == 0.0 {
            return 0.0;
        }
        (dot / denom).clamp(0.0, 1.0)
    }
}

fn l2_norm(vector: &BTreeMap<String, f64>) -> f64 {
    vector.values().map(|weight| weight * weight).sum::<f64>().sqrt()
}

fn term_counts(text: &str) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for token in text
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
    {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Similarity percentage (0-100) between a candidate answer and its reference.
///
/// Both sides are normalized first; an empty candidate scores 0 without
/// consulting the model.
pub fn similarity_score<M: SimilarityModel + ?Sized>(
    model: &M,
    candidate: &str,
    reference: &str,
) -> f64 {
    let candidate = normalize(candidate);
    let reference = normalize(reference);
    if candidate.is_empty() {
        return 0.0;
    }
    model.similarity(&candidate, &reference) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-6
    }

    #[test]
    fn identical_after_normalization_is_full_score() {
        let score = similarity_score(&TfidfCosine, "The Cat.", "the cat");
        assert!(approx(score, 100.0), "score = {score}");
    }

    #[test]
    fn empty_candidate_scores_zero() {
        assert_eq!(similarity_score(&TfidfCosine, "", "anything at all"), 0.0);
        assert_eq!(similarity_score(&TfidfCosine, "?!", "anything at all"), 0.0);
    }

    #[test]
    fn disjoint_vocabularies_score_zero() {
        let score = similarity_score(&TfidfCosine, "red apple", "blue ocean");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn partial_overlap_uses_smoothed_idf() {
        // shared terms weigh 1, unique terms 1 + ln(1.5)
        let unique = 1.0 + 1.5_f64.ln();
        let expected = 2.0 / (2.0 + unique * unique) * 100.0;
        let score = similarity_score(&TfidfCosine, "the cat sat", "the cat ran");
        assert!(approx(score, expected), "score = {score}");
        assert!(score > 50.0 && score < 51.0);
    }

    #[test]
    fn single_character_tokens_are_ignored() {
        assert_eq!(TfidfCosine.similarity("a b c", "a b c"), 0.0);
        let score = TfidfCosine.similarity("a cat", "the cat");
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn repeated_terms_count() {
        let once = TfidfCosine.similarity("water cycle", "water water cycle");
        assert!(once < 1.0);
        let same = TfidfCosine.similarity("water water cycle", "water water cycle");
        assert!(approx(same, 1.0));
    }

    #[test]
    fn word_order_does_not_change_the_score_bits() {
        let reference = "evaporation condensation precipitation collection of water";
        let answer = "water evaporation rain cloud collection";
        let forward = TfidfCosine.similarity(answer, reference);
        let shuffled = TfidfCosine.similarity("collection cloud rain evaporation water", reference);
        assert_eq!(forward.to_bits(), shuffled.to_bits());
        for _ in 0..16 {
            let again = TfidfCosine.similarity(answer, reference);
            assert_eq!(again.to_bits(), forward.to_bits());
        }
    }

    struct Fixed(f64);

    impl SimilarityModel for Fixed {
        fn similarity(&self, _candidate: &str, _reference: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn model_result_is_scaled_to_percent() {
        assert!(approx(similarity_score(&Fixed(0.42), "some words", "ref"), 42.0));
    }
}
