//! Question answering over a fixed knowledge base.
//!
//! Raw questions go through the text normalizer, get projected onto a
//! precomputed TF-IDF vocabulary and are matched against the stored
//! document weight matrix by cosine similarity. The single best document
//! and its answer snippet are returned.

pub mod clean;
pub mod error;
pub mod expand;
pub mod index;
pub mod lemma;
pub mod normalize;
pub mod persist;
pub mod retriever;
pub mod session;
pub mod stopwords;
pub mod tfidf;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use error::{ModelLoadError, NormalizeError};
pub use normalize::{clean_text, prepare_text, NormalizeOptions, Normalizer};
pub use retriever::{Answer, Retriever};
pub use session::{ask, record, AnswerSource, Chat, Conversation, User};

/// Column index into the fitted vocabulary.
pub type TermId = u32;

/// Externally assigned, stable document identifier.
pub type DocId = String;

/// One knowledge base entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub answer_snippet: Option<String>,
}
