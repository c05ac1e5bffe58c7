use crate::error::ModelLoadError;
use crate::index::WeightMatrix;
use crate::normalize::{NormalizeOptions, Normalizer};
use crate::tfidf::{TfidfModel, TfidfParams};
use crate::{DocId, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

pub const BUNDLE_VERSION: u32 = 1;
pub const DEFAULT_DATA_FILE: &str = "gig_docs.jsonl";
pub const DEFAULT_BUNDLE_FILE: &str = "tfidf_bundle.bin";

pub const DOC_ID_FIELD: &str = "Doc_ID";
pub const ANSWER_FIELD: &str = "Answer_Snippet";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
}

/// Everything fitted offline: the model, one weight row per document and the
/// document ids in row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeightBundle {
    pub meta: BundleMeta,
    pub model: TfidfModel,
    pub matrix: WeightMatrix,
    pub doc_ids: Vec<DocId>,
}

/// Locations of the two artifacts inside a data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
    data_file: String,
    bundle_file: String,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            data_file: DEFAULT_DATA_FILE.to_string(),
            bundle_file: DEFAULT_BUNDLE_FILE.to_string(),
        }
    }

    pub fn with_data_file(mut self, name: impl Into<String>) -> Self {
        self.data_file = name.into();
        self
    }

    pub fn with_bundle_file(mut self, name: impl Into<String>) -> Self {
        self.bundle_file = name.into();
        self
    }

    pub fn dataset(&self) -> PathBuf {
        self.root.join(&self.data_file)
    }

    pub fn bundle(&self) -> PathBuf {
        self.root.join(&self.bundle_file)
    }
}

/// One row of the document dataset. All fields are kept so the indexer can
/// pick the text it fits on.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRecord {
    pub doc_id: DocId,
    pub answer_snippet: Option<String>,
    pub fields: Map<String, Value>,
}

impl DatasetRecord {
    fn from_value(value: Value, path: &Path, line: usize) -> Result<Self, ModelLoadError> {
        let Value::Object(fields) = value else {
            return Err(ModelLoadError::Inconsistent(format!(
                "{}:{line}: dataset record is not an object",
                path.display()
            )));
        };
        let doc_id = match fields.get(DOC_ID_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(ModelLoadError::Inconsistent(format!(
                    "{}:{line}: record has no usable {DOC_ID_FIELD}",
                    path.display()
                )))
            }
        };
        let answer_snippet = match fields.get(ANSWER_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Ok(Self { doc_id, answer_snippet, fields })
    }

    /// Text of a field, if present and a string.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn document(&self) -> Document {
        Document { doc_id: self.doc_id.clone(), answer_snippet: self.answer_snippet.clone() }
    }
}

fn open(path: &Path) -> Result<File, ModelLoadError> {
    File::open(path).map_err(|source| ModelLoadError::Io { path: path.to_path_buf(), source })
}

/// Read a dataset file. `.json` files hold an array (or a single object);
/// anything else is read as JSON Lines, skipping blank lines.
pub fn load_dataset(path: &Path) -> Result<Vec<DatasetRecord>, ModelLoadError> {
    let reader = BufReader::new(open(path)?);
    let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
    let mut records = Vec::new();
    if is_json {
        let json: Value = serde_json::from_reader(reader)
            .map_err(|source| ModelLoadError::Dataset { path: path.to_path_buf(), line: 0, source })?;
        match json {
            Value::Array(arr) => {
                for (i, v) in arr.into_iter().enumerate() {
                    records.push(DatasetRecord::from_value(v, path, i + 1)?);
                }
            }
            other => records.push(DatasetRecord::from_value(other, path, 1)?),
        }
    } else {
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| ModelLoadError::Io { path: path.to_path_buf(), source })?;
            if line.trim().is_empty() {
                continue;
            }
            let v: Value = serde_json::from_str(&line)
                .map_err(|source| ModelLoadError::Dataset { path: path.to_path_buf(), line: i + 1, source })?;
            records.push(DatasetRecord::from_value(v, path, i + 1)?);
        }
    }
    Ok(records)
}

/// Fit the model on the normalized `text_fields` of every record. Fields
/// that are missing or not strings contribute nothing.
pub fn build_bundle(
    records: &[DatasetRecord],
    text_fields: &[String],
    params: TfidfParams,
    normalizer: &Normalizer,
    created_at: String,
) -> TermWeightBundle {
    let opts = NormalizeOptions::default();
    let docs: Vec<String> = records
        .iter()
        .map(|r| {
            let text: Vec<&str> = text_fields.iter().filter_map(|f| r.text(f)).collect();
            normalizer.prepare(&text.join(" "), &opts).join(" ")
        })
        .collect();
    let (model, matrix) = TfidfModel::fit_transform(&docs, params);
    TermWeightBundle {
        meta: BundleMeta { version: BUNDLE_VERSION, created_at, num_docs: records.len() as u32 },
        model,
        matrix,
        doc_ids: records.iter().map(|r| r.doc_id.clone()).collect(),
    }
}

pub fn save_bundle(path: &Path, bundle: &TermWeightBundle) -> Result<(), ModelLoadError> {
    let write_err = |source| ModelLoadError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(write_err)?;
    }
    let bytes = bincode::serialize(bundle)
        .map_err(|source| ModelLoadError::Bundle { path: path.to_path_buf(), source })?;
    let mut f = File::create(path).map_err(write_err)?;
    f.write_all(&bytes).map_err(write_err)?;
    Ok(())
}

pub fn load_bundle(path: &Path) -> Result<TermWeightBundle, ModelLoadError> {
    let mut f = open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)
        .map_err(|source| ModelLoadError::Io { path: path.to_path_buf(), source })?;
    let bundle: TermWeightBundle = bincode::deserialize(&buf)
        .map_err(|source| ModelLoadError::Bundle { path: path.to_path_buf(), source })?;
    if bundle.meta.version != BUNDLE_VERSION {
        return Err(ModelLoadError::Version { found: bundle.meta.version, expected: BUNDLE_VERSION });
    }
    Ok(bundle)
}
