//! Inverse-document-frequency index over a fixed document set.

use super::tokenize;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A document's term counts, keyed by its position in the build input.
#[derive(Debug, Clone)]
struct IndexDocument {
    terms: HashMap<String, usize>,
}

/// A scored match from [`Index::search`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchHit {
    /// Position of the document in the slice the index was built from.
    pub doc_id: usize,
    /// Sum of tf x idf over the query tokens.
    pub score: f64,
    /// `score` divided by the best score of the same query.
    pub normalized_score: f64,
}

/// Lexical retrieval index.
///
/// Term frequency is the raw occurrence count of a token in a document, not
/// normalized by document length. Windows have near-uniform length, and for
/// comment clustering a raw count keeps short and long comments comparable
/// to the anchor's own self-match.
#[derive(Debug, Clone, Default)]
pub struct Index {
    docs: Vec<IndexDocument>,
    df: HashMap<String, usize>,
}

impl Index {
    /// Tokenize every document once and compute document frequencies.
    pub fn build<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut df: HashMap<String, usize> = HashMap::new();
        let docs = texts
            .iter()
            .map(|text| {
                let mut terms: HashMap<String, usize> = HashMap::new();
                for token in tokenize(text.as_ref()) {
                    *terms.entry(token).or_insert(0) += 1;
                }
                for term in terms.keys() {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
                IndexDocument { terms }
            })
            .collect();

        Self { docs, df }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// `ln(1 + (N + 1) / (df + 1))`
    fn idf(&self, term: &str) -> f64 {
        let n = self.docs.len() as f64;
        let df = self.df.get(term).copied().unwrap_or(0) as f64;
        (1.0 + (n + 1.0) / (df + 1.0)).ln()
    }

    /// Return up to `k` documents best-first.
    ///
    /// Documents that contain none of the query tokens are left out rather
    /// than reported with a zero score. Equal scores keep ascending id order.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let query_terms = tokenize(query);
        let mut scores: Vec<Option<f64>> = vec![None; self.docs.len()];

        for term in &query_terms {
            let idf = self.idf(term);
            for (id, doc) in self.docs.iter().enumerate() {
                let tf = doc.terms.get(term).copied().unwrap_or(0);
                if tf == 0 {
                    continue;
                }
                *scores[id].get_or_insert(0.0) += tf as f64 * idf;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter_map(|(id, score)| score.map(|s| (id, s)))
            .collect();

        // Stable sort: ties stay in ascending id order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);

        let top = ranked.first().map(|(_, s)| *s).unwrap_or(0.0);
        ranked
            .into_iter()
            .map(|(doc_id, score)| SearchHit {
                doc_id,
                score,
                normalized_score: if top > 0.0 { score / top } else { 0.0 },
            })
            .collect()
    }

    /// IDF-weighted share of the query's distinct tokens found in a document.
    ///
    /// Always in `[0, 1]`; zero for unknown ids and token-free queries.
    pub fn coverage(&self, query: &str, doc_id: usize) -> f64 {
        let Some(doc) = self.docs.get(doc_id) else {
            return 0.0;
        };

        let distinct: HashSet<String> = tokenize(query).into_iter().collect();
        let mut total = 0.0;
        let mut matched = 0.0;
        for term in &distinct {
            let idf = self.idf(term);
            total += idf;
            if doc.terms.contains_key(term) {
                matched += idf;
            }
        }

        if total > 0.0 {
            (matched / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
