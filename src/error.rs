use std::path::PathBuf;

/// Failure to turn a source file into a [`Table`](crate::structs::Table).
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("XML error in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("{path}: no columns to parse")]
    NoColumns { path: PathBuf },
    #[error("{path}: item {index} is not a record object")]
    NotARecord { path: PathBuf, index: usize },
    #[error("{path}: record {record} has no <{field}> element")]
    MissingField {
        path: PathBuf,
        record: usize,
        field: &'static str,
    },
    #[error("{path}: record {record} has an empty <{field}> element")]
    EmptyField {
        path: PathBuf,
        record: usize,
        field: &'static str,
    },
    #[error("{path}: record {record} field {field} has invalid value {value:?}: {reason}")]
    InvalidField {
        path: PathBuf,
        record: usize,
        field: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("price in row {row} is not numeric: {value:?}")]
    NonNumericPrice { row: usize, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("cannot append to audit log {path}: {source}")]
pub struct AuditError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
