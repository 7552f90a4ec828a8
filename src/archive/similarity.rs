//! Cosine similarity and brute-force ranking over the entry collection.
//!
//! Every search is a linear scan, O(N·D). There is no secondary index.

use super::types::{Entry, ResonantEntry};

/// Cosine similarity of `a` and `b`, in `[-1, 1]`.
///
/// Zero-magnitude input yields 0, never NaN. Vectors of different lengths
/// score 0, so they never pass a resonance threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);
    if norm_a == 0.0 || norm_b == 0.0 || !norm_a.is_finite() || !norm_b.is_finite() {
        return 0.0;
    }
    let sim = dot / (norm_a * norm_b);
    if sim.is_nan() {
        0.0
    } else {
        sim.clamp(-1.0, 1.0)
    }
}

fn magnitude(v: &[f32]) -> f64 {
    v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt()
}

/// Ranking knobs for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub threshold: f64,
    /// Keep only similarities strictly above `threshold` instead of at-or-above.
    pub strict: bool,
    pub limit: usize,
    pub exclude_ids: Vec<u64>,
}

impl SearchParams {
    pub fn new(threshold: f64, limit: usize) -> Self {
        Self {
            threshold,
            strict: false,
            limit,
            exclude_ids: Vec::new(),
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    fn admits(&self, similarity: f64) -> bool {
        if self.strict {
            similarity > self.threshold
        } else {
            similarity >= self.threshold
        }
    }
}

/// Rank `entries` against `query`: filter by exclusion and threshold, sort
/// descending by similarity (ties keep insertion order), truncate to limit.
pub fn search(entries: Vec<Entry>, query: &[f32], params: &SearchParams) -> Vec<ResonantEntry> {
    let mut scored: Vec<ResonantEntry> = entries
        .into_iter()
        .filter(|entry| !params.exclude_ids.contains(&entry.id))
        .filter_map(|entry| {
            let similarity = cosine_similarity(&entry.embedding, query);
            params
                .admits(similarity)
                .then_some(ResonantEntry { entry, similarity })
        })
        .collect();

    // `sort_by` is stable, so equal scores keep archive order.
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(params.limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::types::{EmotionDetails, EmotionDimensions, EntryKind};
    use chrono::Utc;

    fn entry(id: u64, embedding: Vec<f32>) -> Entry {
        Entry {
            id,
            content: format!("entry {id}"),
            kind: EntryKind::Text,
            embedding,
            emotion: "echo".into(),
            emotion_details: EmotionDetails {
                confidence: 0.0,
                dimensions: EmotionDimensions::default(),
            },
            echo_trace: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = [0.3, -0.2, 0.9, 0.1, 0.0];
        let b = [0.5, 0.5, -0.1, 0.7, 0.2];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn self_similarity_is_one() {
        for v in [
            vec![1.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.9, 0.1, -0.6, -0.4, 0.2],
            vec![3.0, 4.0, 12.0, 0.5, -7.25],
        ] {
            assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_vector_similarity_is_zero() {
        let v = [0.2, 0.4, 0.6, 0.8, 1.0];
        let zero = [0.0; 5];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert_eq!(cosine_similarity(&[], &v), 0.0);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0, 0.0, 0.0]), 0.0);

        // A prefix match is not a match.
        let entries = vec![entry(1, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0])];
        assert!(search(entries, &[1.0, 0.0, 0.0, 0.0, 0.0], &SearchParams::new(0.0, 5)).is_empty());
    }

    #[test]
    fn orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn search_ranks_filters_and_truncates() {
        let entries = vec![
            entry(1, vec![1.0, 0.0, 0.0, 0.0, 0.0]),
            entry(2, vec![0.0, 1.0, 0.0, 0.0, 0.0]),
            entry(3, vec![0.9, 0.1, 0.0, 0.0, 0.0]),
        ];
        let results = search(entries, &[1.0, 0.0, 0.0, 0.0, 0.0], &SearchParams::new(0.7, 5));

        let ids: Vec<u64> = results.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
        assert!((results[1].similarity - 0.9939).abs() < 1e-3);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let entries = vec![
            entry(5, vec![0.0, 1.0, 0.0, 0.0, 0.0]),
            entry(6, vec![0.0, 2.0, 0.0, 0.0, 0.0]),
            entry(7, vec![0.0, 3.0, 0.0, 0.0, 0.0]),
        ];
        let results = search(entries, &[0.0, 1.0, 0.0, 0.0, 0.0], &SearchParams::new(0.5, 10));
        let ids: Vec<u64> = results.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![5, 6, 7]);
    }

    #[test]
    fn exclusion_and_limit() {
        let entries: Vec<Entry> = (1..=6)
            .map(|i| entry(i, vec![1.0, i as f32 * 0.01, 0.0, 0.0, 0.0]))
            .collect();
        let params = SearchParams::new(0.0, 3).excluding([1, 2]);
        let results = search(entries, &[1.0, 0.0, 0.0, 0.0, 0.0], &params);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.entry.id > 2));
    }

    #[test]
    fn strict_threshold_drops_exact_matches() {
        let entries = vec![entry(1, vec![1.0, 1.0, 0.0, 0.0, 0.0])];
        let query = [1.0, 0.0, 0.0, 0.0, 0.0];
        let at = cosine_similarity(&entries[0].embedding, &query);

        let inclusive = search(entries.clone(), &query, &SearchParams::new(at, 5));
        let strict = search(entries, &query, &SearchParams::new(at, 5).strict());
        assert_eq!(inclusive.len(), 1);
        assert!(strict.is_empty());
    }

    #[test]
    fn raising_threshold_never_adds_results() {
        let entries: Vec<Entry> = (0..20)
            .map(|i| {
                let t = i as f32 / 20.0;
                entry(i, vec![1.0 - t, t, 0.5 - t, t * t, 0.1])
            })
            .collect();
        let query = [0.6, 0.4, 0.0, 0.2, 0.1];

        let mut previous = usize::MAX;
        for step in 0..=20 {
            let threshold = -1.0 + step as f64 * 0.1;
            let count = search(entries.clone(), &query, &SearchParams::new(threshold, 100)).len();
            assert!(count <= previous, "threshold {threshold} grew results");
            previous = count;
        }
    }

    #[test]
    fn empty_archive_returns_empty() {
        assert!(search(Vec::new(), &[1.0, 0.0, 0.0, 0.0, 0.0], &SearchParams::new(0.7, 5)).is_empty());
    }
}
