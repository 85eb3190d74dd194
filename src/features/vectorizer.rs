use std::collections::HashMap;

use crate::types::FeatureVector;

/// Log-TF x IDF weighting over a shared vocabulary.
///
/// `weight(t, d) = ln(1 + count(t, d)) * (ln(N / max(df(t), 1)) + 1)`
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfVectorizer {
    /// Keep only terms in the top half of the corpus frequency range.
    pub restrict_to_frequent: bool,
}

/// A fitted vocabulary with per-term IDF.
#[derive(Debug, Clone, Default)]
pub struct TfIdfModel {
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    pub fn new(restrict_to_frequent: bool) -> Self {
        Self {
            restrict_to_frequent,
        }
    }

    /// Learn the vocabulary and IDF from `corpus`. Terms are indexed in order of first
    /// appearance, so the result depends only on the corpus order.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[Vec<S>]) -> TfIdfModel {
        let allowed = if self.restrict_to_frequent {
            Some(frequent_terms(corpus))
        } else {
            None
        };

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for doc in corpus {
            let mut seen: Vec<usize> = Vec::new();
            for token in doc {
                let token = token.as_ref();
                if let Some(allowed) = &allowed {
                    if !allowed.contains_key(token) {
                        continue;
                    }
                }
                let idx = match vocabulary.get(token) {
                    Some(&idx) => idx,
                    None => {
                        let idx = terms.len();
                        vocabulary.insert(token.to_string(), idx);
                        terms.push(token.to_string());
                        doc_freq.push(0);
                        idx
                    }
                };
                if !seen.contains(&idx) {
                    seen.push(idx);
                    doc_freq[idx] += 1;
                }
            }
        }

        let n = corpus.len() as f64;
        let idf = doc_freq
            .iter()
            .map(|&df| (n / df.max(1) as f64).ln() + 1.0)
            .collect();

        TfIdfModel {
            vocabulary,
            terms,
            idf,
        }
    }

    /// Fit on `corpus` and transform every document of it.
    pub fn fit_transform<S: AsRef<str>>(&self, corpus: &[Vec<S>]) -> (TfIdfModel, Vec<FeatureVector>) {
        let model = self.fit(corpus);
        let vectors = corpus.iter().map(|doc| model.transform(doc)).collect();
        (model, vectors)
    }
}

impl TfIdfModel {
    /// Dense weighted vector for one document. Unknown terms are ignored.
    pub fn transform<S: AsRef<str>>(&self, doc: &[S]) -> FeatureVector {
        let mut counts = vec![0u32; self.terms.len()];
        for token in doc {
            if let Some(&idx) = self.vocabulary.get(token.as_ref()) {
                counts[idx] += 1;
            }
        }
        counts
            .iter()
            .zip(&self.idf)
            .map(|(&count, &idf)| (1.0 + count as f64).ln() * idf)
            .collect()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }
}

/// Terms whose total corpus count is at least `min + 0.5 * (max - min)`.
fn frequent_terms<S: AsRef<str>>(corpus: &[Vec<S>]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in corpus.iter().flatten() {
        *counts.entry(token.as_ref()).or_insert(0) += 1;
    }

    let max = counts.values().copied().max().unwrap_or(0);
    let min = counts.values().copied().min().unwrap_or(0);
    let limit = min as f64 + (max - min) as f64 * 0.5;
    counts.retain(|_, &mut count| count as f64 >= limit);
    counts
}
