pub mod audit;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod structs;
pub mod transform;

// Re-export public API
pub use audit::AuditLog;
pub use error::{AuditError, ExtractionError, LoadError, PipelineError, Result, TransformError};
pub use extract::{CAR_FIELDS, Extractor, extract_csv, extract_json, extract_xml};
pub use load::write_csv;
pub use pipeline::{Stage, run};
pub use structs::{EtlConfig, SimpleLogger, SourceFormat, Table, Value};
pub use transform::{PRICE_COLUMN, Transformed, round_to_cents, transform};
