//! TF-IDF vectorization and cosine-similarity ranking.
//!
//! Weighting follows the smoothed scheme used by scikit-learn's
//! `TfidfVectorizer`: raw term counts times `ln((1 + n) / (1 + df)) + 1`,
//! with each document vector L2-normalized.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::stopwords::is_stop_word;
use crate::{Candidate, DEFAULT_TOP_K, RankedCandidate};

/// Lowercase, split into runs of two or more word characters, drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Sparse L2-normalized vector, entries sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_val) = self.entries[i];
            let (b_idx, b_val) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += a_val * b_val;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Cosine similarity of two normalized vectors. Zero vectors score `0.0`.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    a.dot(b).clamp(0.0, 1.0)
}

/// A TF-IDF model fitted on a corpus, holding the fitted vectors.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl TfidfModel {
    /// Fit on `corpus` and vectorize every document in it.
    ///
    /// With `max_df = Some(r)`, terms whose document frequency exceeds
    /// `r * corpus.len()` are excluded from the vocabulary.
    pub fn fit(corpus: &[&str], max_df: Option<f64>) -> Self {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|d| tokenize(d)).collect();
        let n_docs = tokenized.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = max_df.map(|r| r * n_docs as f64);
        let mut kept: Vec<(&str, usize)> = df
            .into_iter()
            .filter(|&(_, count)| max_count.is_none_or(|max| count as f64 <= max))
            .collect();
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, count)) in kept.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), index);
            idf.push(((1.0 + n_docs as f64) / (1.0 + count as f64)).ln() + 1.0);
        }

        let mut model = Self {
            vocabulary,
            idf,
            vectors: Vec::new(),
        };
        model.vectors = tokenized.iter().map(|t| model.weigh(t)).collect();
        model
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        } else {
            entries.clear();
        }
        SparseVector { entries }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }
}

/// Similarity of `query` to each text, in input order.
///
/// The query is fitted together with the texts, so its terms count towards
/// document frequencies.
pub fn similarity_scores(query: &str, texts: &[&str], max_df: Option<f64>) -> Vec<f64> {
    if texts.is_empty() {
        return Vec::new();
    }
    let mut corpus: Vec<&str> = texts.to_vec();
    corpus.push(query);

    let model = TfidfModel::fit(&corpus, max_df);
    let Some((query_vec, candidate_vecs)) = model.vectors().split_last() else {
        return vec![0.0; texts.len()];
    };

    tracing::debug!(
        candidates = texts.len(),
        vocabulary = model.vocabulary_len(),
        "fitted tf-idf model"
    );

    candidate_vecs
        .iter()
        .map(|v| cosine_similarity(query_vec, v))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub top_k: usize,
    pub max_df: Option<f64>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_df: None,
        }
    }
}

/// Score every candidate against `query` and keep the best `top_k`.
///
/// Sorting is stable, so equal scores keep their encounter order. Ranks are
/// dense and 1-based.
pub fn rank(query: &str, candidates: Vec<Candidate>, options: &RankOptions) -> Vec<RankedCandidate> {
    let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
    let scores = similarity_scores(query, &texts, options.max_df);

    let mut scored: Vec<(Candidate, f64)> = candidates.into_iter().zip(scores).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(options.top_k);

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, score))| RankedCandidate {
            candidate,
            score,
            rank: i + 1,
        })
        .collect()
}
