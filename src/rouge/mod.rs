//! ROUGE overlap metrics between a reference text and a candidate summary.
//!
//! Tokens are lowercased ASCII alphanumerics; tokens longer than three
//! characters are reduced with the Porter stemmer before counting.

mod porter;

use std::collections::HashMap;

use serde::Serialize;

const MIN_STEM_LEN: usize = 3;

/// Precision, recall and f-measure for a single ROUGE variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Score {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl Score {
    fn from_counts(matched: usize, candidate_total: usize, reference_total: usize) -> Self {
        let precision = matched as f64 / candidate_total.max(1) as f64;
        let recall = matched as f64 / reference_total.max(1) as f64;
        Self {
            precision,
            recall,
            fmeasure: fmeasure(precision, recall),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RougeScores {
    pub rouge1: Score,
    pub rouge2: Score,
    #[serde(rename = "rougeL")]
    pub rouge_l: Score,
}

pub struct RougeScorer {
    use_stemmer: bool,
}

impl Default for RougeScorer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RougeScorer {
    pub fn new(use_stemmer: bool) -> Self {
        Self { use_stemmer }
    }

    /// Scores `candidate` against `reference`. Precision is measured on the
    /// candidate, recall on the reference.
    pub fn score(&self, reference: &str, candidate: &str) -> RougeScores {
        let reference_tokens = self.tokenize(reference);
        let candidate_tokens = self.tokenize(candidate);

        RougeScores {
            rouge1: ngram_score(&reference_tokens, &candidate_tokens, 1),
            rouge2: ngram_score(&reference_tokens, &candidate_tokens, 2),
            rouge_l: lcs_score(&reference_tokens, &candidate_tokens),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        lowered
            .split(|ch: char| !(ch.is_ascii_lowercase() || ch.is_ascii_digit()))
            .filter(|token| !token.is_empty())
            .map(|token| {
                if self.use_stemmer && token.len() > MIN_STEM_LEN {
                    porter::stem(token)
                } else {
                    token.to_string()
                }
            })
            .filter(|token| !token.is_empty())
            .collect()
    }
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

fn ngram_score(reference: &[String], candidate: &[String], n: usize) -> Score {
    let reference_counts = ngram_counts(reference, n);
    let candidate_counts = ngram_counts(candidate, n);

    let matched: usize = candidate_counts
        .iter()
        .map(|(gram, count)| {
            reference_counts
                .get(gram)
                .map_or(0, |reference_count| (*count).min(*reference_count))
        })
        .sum();

    Score::from_counts(
        matched,
        candidate_counts.values().sum(),
        reference_counts.values().sum(),
    )
}

fn lcs_score(reference: &[String], candidate: &[String]) -> Score {
    if reference.is_empty() || candidate.is_empty() {
        return Score::default();
    }

    let lcs = lcs_length(reference, candidate);
    let precision = lcs as f64 / candidate.len() as f64;
    let recall = lcs as f64 / reference.len() as f64;
    Score {
        precision,
        recall,
        fmeasure: fmeasure(precision, recall),
    }
}

/// Length of the longest common subsequence, using two rolling rows.
fn lcs_length(reference: &[String], candidate: &[String]) -> usize {
    let mut previous = vec![0usize; candidate.len() + 1];
    let mut current = vec![0usize; candidate.len() + 1];

    for reference_token in reference {
        for (j, candidate_token) in candidate.iter().enumerate() {
            current[j + 1] = if reference_token == candidate_token {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[candidate.len()]
}

fn fmeasure(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_perfect(score: Score) {
        assert_close(score.precision, 1.0);
        assert_close(score.recall, 1.0);
        assert_close(score.fmeasure, 1.0);
    }

    #[test]
    fn identical_texts_score_perfectly() {
        let scorer = RougeScorer::default();
        let text = "The randomized trial showed reduced mortality among treated patients.";
        let scores = scorer.score(text, text);

        assert_perfect(scores.rouge1);
        assert_perfect(scores.rouge2);
        assert_perfect(scores.rouge_l);
    }

    #[test]
    fn disjoint_vocabularies_score_zero() {
        let scorer = RougeScorer::default();
        let scores = scorer.score("alpha beta gamma delta", "epsilon zeta eta theta");

        for score in [scores.rouge1, scores.rouge2, scores.rouge_l] {
            assert_close(score.precision, 0.0);
            assert_close(score.recall, 0.0);
            assert_close(score.fmeasure, 0.0);
        }
    }

    #[test]
    fn tokenizer_lowercases_and_splits_on_non_alphanumerics() {
        let scorer = RougeScorer::new(false);
        assert_eq!(
            scorer.tokenize("COVID-19 cases, (n=42) rose!"),
            vec!["covid", "19", "cases", "n", "42", "rose"]
        );
        assert!(scorer.tokenize("— … ¿?").is_empty());
    }

    #[test]
    fn stemming_only_applies_to_longer_tokens() {
        let scorer = RougeScorer::default();
        let tokens = scorer.tokenize("running runs ran cats");
        assert_eq!(tokens, vec!["run", "run", "ran", "cat"]);
    }

    #[test]
    fn stemmed_inflections_match() {
        let scorer = RougeScorer::default();
        let scores = scorer.score("patients responded", "patient responds");
        assert_perfect(scores.rouge1);
    }

    #[test]
    fn ly_adverbs_keep_their_porter_stem() {
        let scorer = RougeScorer::default();
        assert_eq!(scorer.tokenize("fairly"), vec!["fairli"]);

        let scores = scorer.score("significant", "significantly");
        assert_eq!(scores.rouge1, Score::default());
    }

    #[test]
    fn partial_overlap_matches_reference_definition() {
        let scorer = RougeScorer::new(false);
        let scores = scorer.score("the cat sat on the mat", "the cat lay on the mat");

        // unigrams: 5 of 6 shared
        assert_close(scores.rouge1.precision, 5.0 / 6.0);
        assert_close(scores.rouge1.recall, 5.0 / 6.0);
        // bigrams: "the cat", "on the", "the mat" shared out of 5
        assert_close(scores.rouge2.precision, 3.0 / 5.0);
        assert_close(scores.rouge2.recall, 3.0 / 5.0);
        assert_close(scores.rouge_l.precision, 5.0 / 6.0);
    }

    #[test]
    fn clipped_counts_for_repeated_ngrams() {
        let scorer = RougeScorer::new(false);
        let scores = scorer.score("data data model", "data data data data");

        assert_close(scores.rouge1.precision, 2.0 / 4.0);
        assert_close(scores.rouge1.recall, 2.0 / 3.0);
    }

    #[test]
    fn lcs_respects_order() {
        let scorer = RougeScorer::new(false);
        let scores = scorer.score("a b c d e", "e d c b a");

        assert_close(scores.rouge_l.precision, 1.0 / 5.0);
        assert_close(scores.rouge1.precision, 1.0);
    }

    #[test]
    fn empty_candidate_scores_zero() {
        let scorer = RougeScorer::default();
        let scores = scorer.score("some reference text", "");

        assert_eq!(scores.rouge1, Score::default());
        assert_eq!(scores.rouge2, Score::default());
        assert_eq!(scores.rouge_l, Score::default());
    }
}
