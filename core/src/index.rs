use crate::TermId;
use serde::{Deserialize, Serialize};

/// Sparse weight vector: parallel arrays of strictly increasing term ids and
/// their weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<TermId>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from `(term, weight)` pairs already sorted by term.
    pub fn from_sorted(pairs: impl IntoIterator<Item = (TermId, f32)>) -> Self {
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Scale to unit length. A zero vector stays zero.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() {
                *v /= norm;
            }
        }
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Check the shape invariants against a vocabulary of `dims` columns.
    pub fn check(&self, dims: usize) -> Result<(), String> {
        if self.indices.len() != self.values.len() {
            return Err(format!("{} indices but {} values", self.indices.len(), self.values.len()));
        }
        if self.indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err("term indices are not strictly increasing".into());
        }
        if let Some(&last) = self.indices.last() {
            if last as usize >= dims {
                return Err(format!("term index {last} out of range for {dims} columns"));
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err("non-finite weight".into());
        }
        Ok(())
    }
}

/// Cosine similarity; 0 when either side has zero length.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let na = a.norm();
    let nb = b.norm();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    a.dot(b) / (na * nb)
}

/// One weight row per document, row order aligned with the document id
/// sequence stored next to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightMatrix {
    pub n_cols: usize,
    pub rows: Vec<SparseVector>,
}

impl WeightMatrix {
    pub fn new(n_cols: usize, rows: Vec<SparseVector>) -> Self {
        Self { n_cols, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cosine similarity of `query` against every row, in row order.
    pub fn score(&self, query: &SparseVector) -> Vec<f32> {
        self.rows.iter().map(|row| cosine_similarity(query, row)).collect()
    }

    pub fn check(&self) -> Result<(), String> {
        for (i, row) in self.rows.iter().enumerate() {
            row.check(self.n_cols).map_err(|e| format!("row {i}: {e}"))?;
        }
        Ok(())
    }
}

/// Index of the highest score; ties go to the lowest index. `None` only for
/// an empty slice.
pub fn best_match(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}
