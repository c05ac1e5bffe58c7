use crate::index::{SparseVector, WeightMatrix};
use crate::TermId;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

lazy_static! {
    /// Terms are runs of two or more word characters.
    static ref TERM: Regex = Regex::new(r"\b\w\w+\b").expect("valid regex");
}

/// Weighting knobs fixed at fit time and persisted with the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfidfParams {
    /// idf = ln((1 + n) / (1 + df)) + 1 instead of ln(n / df) + 1
    pub smooth_idf: bool,
    /// tf = 1 + ln(count) instead of the raw count
    pub sublinear_tf: bool,
}

impl Default for TfidfParams {
    fn default() -> Self {
        Self { smooth_idf: true, sublinear_tf: false }
    }
}

/// Split already-normalized text into vocabulary terms.
pub fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Fitted vocabulary plus inverse document frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfModel {
    pub vocabulary: HashMap<String, TermId>,
    pub idf: Vec<f32>,
    pub params: TfidfParams,
}

impl TfidfModel {
    /// Fit over a corpus of normalized documents. Term ids follow the sorted
    /// order of the terms.
    pub fn fit(docs: &[String], params: TfidfParams) -> Self {
        let mut df: BTreeMap<String, u32> = BTreeMap::new();
        for doc in docs {
            let seen: HashSet<String> = analyze(doc).into_iter().collect();
            for term in seen {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = docs.len() as f64;
        let mut vocabulary = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (tid, (term, df_t)) in df.into_iter().enumerate() {
            let df_t = df_t as f64;
            let w = if params.smooth_idf {
                ((1.0 + n) / (1.0 + df_t)).ln() + 1.0
            } else {
                (n / df_t).ln() + 1.0
            };
            vocabulary.insert(term, tid as TermId);
            idf.push(w as f32);
        }
        Self { vocabulary, idf, params }
    }

    /// Fit, then weight every training document. Rows come back in input
    /// order.
    pub fn fit_transform(docs: &[String], params: TfidfParams) -> (Self, WeightMatrix) {
        let model = Self::fit(docs, params);
        let rows = docs.iter().map(|d| model.transform(d)).collect();
        let matrix = WeightMatrix::new(model.num_terms(), rows);
        (model, matrix)
    }

    pub fn num_terms(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized tf-idf vector for `text`. Terms outside the vocabulary
    /// are ignored, so unseen input yields an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in analyze(text) {
            if let Some(&tid) = self.vocabulary.get(&term) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let mut vector = SparseVector::from_sorted(counts.into_iter().map(|(tid, count)| {
            let tf = if self.params.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
            (tid, tf * self.idf[tid as usize])
        }));
        vector.l2_normalize();
        vector
    }

    /// Structural checks run when a persisted model is loaded.
    pub fn check(&self) -> Result<(), String> {
        if self.vocabulary.len() != self.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} entries",
                self.vocabulary.len(),
                self.idf.len()
            ));
        }
        let ids: BTreeSet<TermId> = self.vocabulary.values().copied().collect();
        if ids.len() != self.vocabulary.len() {
            return Err("vocabulary maps two terms to the same column".into());
        }
        if let Some(&max) = ids.last() {
            if max as usize >= self.idf.len() {
                return Err(format!("term id {max} out of range"));
            }
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err("non-finite idf weight".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "deposit limit player".to_string(),
            "withdrawal limit".to_string(),
            "bonus wager".to_string(),
        ]
    }

    #[test]
    fn analyzer_drops_single_characters() {
        assert_eq!(analyze("a rtp of 9 percent"), vec!["rtp", "of", "percent"]);
    }

    #[test]
    fn vocabulary_is_sorted() {
        let model = TfidfModel::fit(&corpus(), TfidfParams::default());
        assert_eq!(model.vocabulary["bonus"], 0);
        assert_eq!(model.vocabulary["withdrawal"], model.num_terms() as TermId - 1);
        assert!(model.check().is_ok());
    }

    #[test]
    fn smooth_idf_values() {
        let model = TfidfModel::fit(&corpus(), TfidfParams::default());
        let limit = model.idf[model.vocabulary["limit"] as usize];
        let bonus = model.idf[model.vocabulary["bonus"] as usize];
        assert!((limit - ((4.0f32 / 3.0).ln() + 1.0)).abs() < 1e-6);
        assert!((bonus - ((4.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn unsmoothed_idf_values() {
        let params = TfidfParams { smooth_idf: false, sublinear_tf: false };
        let model = TfidfModel::fit(&corpus(), params);
        let limit = model.idf[model.vocabulary["limit"] as usize];
        assert!((limit - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn transform_drops_unknown_terms() {
        let model = TfidfModel::fit(&corpus(), TfidfParams::default());
        assert!(model.transform("jackpot roulette").is_empty());
        let v = model.transform("bonus jackpot");
        assert_eq!(v.indices, vec![model.vocabulary["bonus"]]);
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fit_transform_rows_follow_input_order() {
        let (model, matrix) = TfidfModel::fit_transform(&corpus(), TfidfParams::default());
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.n_cols, model.num_terms());
        assert!(matrix.rows[2].indices.contains(&model.vocabulary["wager"]));
        assert!(matrix.check().is_ok());
    }
}
