use crate::error::{ModelLoadError, NormalizeError};
use crate::index::{best_match, SparseVector, WeightMatrix};
use crate::normalize::{default_normalizer, expect_str, NormalizeOptions, Normalizer};
use crate::persist::{load_bundle, load_dataset, DataPaths, TermWeightBundle};
use crate::tfidf::TfidfModel;
use crate::{DocId, Document};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Best match for a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub answer: Option<String>,
    pub doc_id: DocId,
    pub score: f32,
}

/// Matches questions against the loaded knowledge base. Immutable after
/// construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct Retriever {
    normalizer: Arc<Normalizer>,
    model: TfidfModel,
    matrix: WeightMatrix,
    doc_ids: Vec<DocId>,
    answers: HashMap<DocId, Option<String>>,
}

impl Retriever {
    /// Load the dataset and the term-weighting bundle from `paths`.
    pub fn load(paths: &DataPaths) -> Result<Self, ModelLoadError> {
        Self::load_with(paths, Arc::new(default_normalizer().clone()))
    }

    pub fn load_with(paths: &DataPaths, normalizer: Arc<Normalizer>) -> Result<Self, ModelLoadError> {
        let documents: Vec<Document> = load_dataset(&paths.dataset())?
            .iter()
            .map(|r| r.document())
            .collect();
        let bundle = load_bundle(&paths.bundle())?;
        let retriever = Self::new(bundle, documents, normalizer)?;
        tracing::info!(
            num_docs = retriever.num_docs(),
            num_terms = retriever.num_terms(),
            bundle = %paths.bundle().display(),
            "knowledge base loaded"
        );
        Ok(retriever)
    }

    /// Assemble from parts, checking that model, matrix, id sequence and
    /// document table agree with each other.
    pub fn new(
        bundle: TermWeightBundle,
        documents: Vec<Document>,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self, ModelLoadError> {
        let TermWeightBundle { meta, model, matrix, doc_ids } = bundle;
        let inconsistent = ModelLoadError::Inconsistent;

        model.check().map_err(inconsistent)?;
        matrix.check().map_err(inconsistent)?;
        if matrix.n_cols != model.num_terms() {
            return Err(inconsistent(format!(
                "matrix has {} columns but the vocabulary has {} terms",
                matrix.n_cols,
                model.num_terms()
            )));
        }
        if doc_ids.is_empty() {
            return Err(inconsistent("the knowledge base has no documents".into()));
        }
        if matrix.n_rows() != doc_ids.len() {
            return Err(inconsistent(format!(
                "matrix has {} rows but {} document ids",
                matrix.n_rows(),
                doc_ids.len()
            )));
        }
        if meta.num_docs as usize != doc_ids.len() {
            return Err(inconsistent(format!(
                "bundle meta claims {} documents but holds {}",
                meta.num_docs,
                doc_ids.len()
            )));
        }
        let row_ids: HashSet<&DocId> = doc_ids.iter().collect();
        if row_ids.len() != doc_ids.len() {
            return Err(inconsistent("duplicate document id in the bundle".into()));
        }

        let mut answers = HashMap::with_capacity(documents.len());
        for doc in documents {
            if !row_ids.contains(&doc.doc_id) {
                return Err(inconsistent(format!("document {} has no weight row", doc.doc_id)));
            }
            if answers.insert(doc.doc_id.clone(), doc.answer_snippet).is_some() {
                return Err(inconsistent(format!("duplicate document {} in the dataset", doc.doc_id)));
            }
        }
        if answers.len() != doc_ids.len() {
            return Err(inconsistent(format!(
                "dataset has {} documents but the bundle has {} rows",
                answers.len(),
                doc_ids.len()
            )));
        }

        Ok(Self { normalizer, model, matrix, doc_ids, answers })
    }

    pub fn num_docs(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn num_terms(&self) -> usize {
        self.model.num_terms()
    }

    /// Normalize `question` with default options and project it onto the
    /// fitted vocabulary.
    pub fn transform(&self, question: &str) -> SparseVector {
        let tokens = self.normalizer.prepare(question, &NormalizeOptions::default());
        self.model.transform(&tokens.join(" "))
    }

    /// Cosine similarity of `query` against every document, in row order.
    pub fn score(&self, query: &SparseVector) -> Vec<f32> {
        self.matrix.score(query)
    }

    /// Single best document for `question`. Always returns a document, even
    /// when nothing overlaps; ties go to the earliest row.
    pub fn find_answer(&self, question: &str) -> Answer {
        let query = self.transform(question);
        let scores = self.score(&query);
        // `new` refuses an empty matrix, so there is always a best row.
        let best = best_match(&scores).unwrap_or(0);
        let doc_id = self.doc_ids[best].clone();
        let score = scores.get(best).copied().unwrap_or(0.0);
        tracing::debug!(question, terms = query.len(), %doc_id, score, "matched question");
        Answer { answer: self.lookup(&doc_id), doc_id, score }
    }

    /// [`Retriever::find_answer`] for a value of unknown type.
    pub fn find_answer_value(&self, question: &serde_json::Value) -> Result<Answer, NormalizeError> {
        Ok(self.find_answer(expect_str(question)?))
    }

    /// Answer snippet stored for `doc_id`, if the document is known.
    pub fn answer_for(&self, doc_id: &str) -> Option<Option<&str>> {
        self.answers.get(doc_id).map(|a| a.as_deref())
    }

    fn lookup(&self, doc_id: &str) -> Option<String> {
        match self.answers.get(doc_id) {
            Some(answer) => answer.clone(),
            None => {
                tracing::warn!(doc_id, "matched document is missing from the document table");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{BundleMeta, BUNDLE_VERSION};
    use crate::tfidf::TfidfParams;

    fn normalizer() -> Arc<Normalizer> {
        Arc::new(Normalizer::default())
    }

    fn bundle_for(texts: &[&str], ids: &[&str]) -> TermWeightBundle {
        let docs: Vec<String> = texts
            .iter()
            .map(|t| default_normalizer().prepare(t, &NormalizeOptions::default()).join(" "))
            .collect();
        let (model, matrix) = TfidfModel::fit_transform(&docs, TfidfParams::default());
        TermWeightBundle {
            meta: BundleMeta { version: BUNDLE_VERSION, created_at: String::new(), num_docs: ids.len() as u32 },
            model,
            matrix,
            doc_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn documents(ids: &[&str]) -> Vec<Document> {
        ids.iter()
            .map(|id| Document { doc_id: id.to_string(), answer_snippet: Some(format!("answer {id}")) })
            .collect()
    }

    fn sample() -> Retriever {
        let ids = ["d1", "d2", "d3"];
        Retriever::new(
            bundle_for(
                &["How do I set deposit limits?", "Bonus wagering requirements", "Withdrawal takes three days"],
                &ids,
            ),
            documents(&ids),
            normalizer(),
        )
        .unwrap()
    }

    #[test]
    fn finds_the_overlapping_document() {
        let r = sample();
        let a = r.find_answer("what are the wagering rules for a bonus");
        assert_eq!(a.doc_id, "d2");
        assert_eq!(a.answer.as_deref(), Some("answer d2"));
        assert!(a.score > 0.0 && a.score <= 1.0 + 1e-6);
        assert_eq!(r.find_answer("withdrawal").doc_id, "d3");
    }

    #[test]
    fn no_overlap_falls_back_to_the_first_row() {
        let r = sample();
        for q in ["", "what is the", "roulette jackpot"] {
            let a = r.find_answer(q);
            assert_eq!(a.doc_id, "d1", "query {q:?}");
            assert_eq!(a.score, 0.0);
        }
    }

    #[test]
    fn ties_go_to_the_earliest_row() {
        let ids = ["x", "y"];
        let r = Retriever::new(bundle_for(&["bonus", "bonus"], &ids), documents(&ids), normalizer()).unwrap();
        assert_eq!(r.find_answer("bonus").doc_id, "x");
    }

    #[test]
    fn scores_cover_every_row() {
        let r = sample();
        assert_eq!(r.num_docs(), 3);
        let scores = r.score(&r.transform("deposit limits"));
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert_eq!(r.answer_for("d1"), Some(Some("answer d1")));
        assert_eq!(r.answer_for("nope"), None);
    }

    #[test]
    fn lookup_miss_returns_no_answer_but_keeps_the_id() {
        let ids = ["d1", "d2"];
        let mut r = Retriever::new(
            bundle_for(&["deposit limits", "bonus wagering"], &ids),
            documents(&ids),
            normalizer(),
        )
        .unwrap();
        r.answers.remove("d2");
        let a = r.find_answer("bonus wagering");
        assert_eq!(a.doc_id, "d2");
        assert_eq!(a.answer, None);
    }

    #[test]
    fn rejects_row_count_mismatch() {
        let mut bundle = bundle_for(&["deposit limits", "bonus wagering"], &["d1", "d2"]);
        bundle.matrix.rows.push(SparseVector::default());
        let err = Retriever::new(bundle, documents(&["d1", "d2"]), normalizer()).unwrap_err();
        assert!(matches!(err, ModelLoadError::Inconsistent(_)));
    }

    #[test]
    fn rejects_documents_without_rows() {
        let bundle = bundle_for(&["deposit limits", "bonus wagering"], &["d1", "d2"]);
        let err = Retriever::new(bundle, documents(&["d1", "d3"]), normalizer()).unwrap_err();
        assert!(matches!(err, ModelLoadError::Inconsistent(_)));
    }

    #[test]
    fn rejects_missing_documents_and_duplicates() {
        let bundle = bundle_for(&["deposit limits", "bonus wagering"], &["d1", "d2"]);
        assert!(Retriever::new(bundle.clone(), documents(&["d1"]), normalizer()).is_err());
        assert!(Retriever::new(bundle, documents(&["d1", "d1"]), normalizer()).is_err());
        let dup = bundle_for(&["deposit limits", "bonus wagering"], &["d1", "d1"]);
        assert!(Retriever::new(dup, documents(&["d1"]), normalizer()).is_err());
    }

    #[test]
    fn rejects_empty_knowledge_base() {
        let bundle = bundle_for(&[], &[]);
        assert!(Retriever::new(bundle, vec![], normalizer()).is_err());
    }

    #[test]
    fn rejects_column_mismatch() {
        let mut bundle = bundle_for(&["deposit limits", "bonus wagering"], &["d1", "d2"]);
        bundle.matrix.n_cols += 1;
        assert!(Retriever::new(bundle, documents(&["d1", "d2"]), normalizer()).is_err());
    }

    #[test]
    fn non_string_questions_are_rejected() {
        let ids = ["d1"];
        let r = Retriever::new(bundle_for(&["deposit limits"], &ids), documents(&ids), normalizer()).unwrap();
        assert!(r.find_answer_value(&serde_json::json!(12)).is_err());
        assert_eq!(r.find_answer_value(&serde_json::json!("limits")).unwrap().doc_id, "d1");
    }
}
