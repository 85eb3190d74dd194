use rayon::prelude::*;

use crate::error::{MarqueeError, Result};
use crate::types::{FeatureVector, MovieId, SimilarityRow};

use super::pearson::{round_score, Centered};

/// A fully computed similarity matrix. `rows[i][j]` is the rounded correlation between
/// `ids[i]` and `ids[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<MovieId>,
    rows: Vec<Vec<f64>>,
}

impl SimilarityMatrix {
    /// Pairwise Pearson correlation of `vectors`, one row per id.
    ///
    /// Rows are computed in parallel and collected in index order. The diagonal is 1.0
    /// and a pair involving a zero-variance vector scores 0.0.
    pub fn compute(ids: Vec<MovieId>, vectors: &[FeatureVector]) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(MarqueeError::SimilarityMatrix(format!(
                "{} ids for {} feature vectors",
                ids.len(),
                vectors.len()
            )));
        }
        if let Some(dim) = vectors.first().map(Vec::len) {
            if let Some((pos, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dim) {
                return Err(MarqueeError::MalformedFeatureData {
                    movie_id: ids[pos],
                    reason: format!("vector has {} dimensions, expected {dim}", v.len()),
                });
            }
        }

        let centered: Vec<Centered> = vectors.par_iter().map(|v| Centered::new(v)).collect();

        let rows: Vec<Vec<f64>> = (0..centered.len())
            .into_par_iter()
            .map(|i| {
                centered
                    .iter()
                    .enumerate()
                    .map(|(j, other)| {
                        if i == j {
                            1.0
                        } else {
                            round_score(centered[i].correlation(other))
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(Self { ids, rows })
    }

    /// Wrap precomputed rows, checking they form a square matrix over `ids`.
    pub fn from_rows(ids: Vec<MovieId>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != ids.len() {
            return Err(MarqueeError::SimilarityMatrix(format!(
                "matrix has {} rows but the catalog order has {} items",
                rows.len(),
                ids.len()
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ids.len()) {
            return Err(MarqueeError::SimilarityMatrix(format!(
                "row {i} has {} columns, expected {}",
                row.len(),
                ids.len()
            )));
        }
        Ok(Self { ids, rows })
    }

    pub fn ids(&self) -> &[MovieId] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<SimilarityRow> {
        self.rows.get(index).map(|scores| SimilarityRow {
            row_index: index,
            scores: scores.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Headerless CSV, one matrix row per line.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for row in &self.rows {
            writer.write_record(row.iter().map(|s| s.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|e| MarqueeError::Internal(format!("csv flush failed: {e}")))
    }

    /// Parse a matrix previously written by [`to_csv`](Self::to_csv) against `ids`.
    pub fn from_csv(ids: Vec<MovieId>, data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|e| {
                        MarqueeError::SimilarityMatrix(format!(
                            "line {}: invalid score {field:?}: {e}",
                            line + 1
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }
        Self::from_rows(ids, rows)
    }
}
