use chrono::Local;
use log::{Log, Metadata, Record as LogRecord};
use std::fmt;
use std::path::{Path, PathBuf};

/// Console logger for diagnostics; the audit trail goes through [`crate::audit::AuditLog`].
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        eprintln!(
            "{} [{}] {}",
            Local::now().format("%H:%M:%S"),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// A single cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Null | Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            // Floats must never print as integers, or they read back as Int.
            Value::Float(v) if v.is_nan() => Ok(()),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:e}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// Format-agnostic table shared by every pipeline stage.
///
/// Rows are stored positionally against `columns`, so every row carries
/// exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding missing trailing cells with [`Value::Null`]
    /// and dropping any cells beyond the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Mutable access to every cell of the column at `idx`, in row order.
    pub fn column_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Value> {
        self.rows.iter_mut().filter_map(move |r| r.get_mut(idx))
    }
}

/// Input formats understood by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceFormat {
    Csv,
    Json,
    Xml,
}

impl SourceFormat {
    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Json => "JSON",
            SourceFormat::Xml => "XML",
        }
    }

    /// Picks a format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(SourceFormat::Json),
            "xml" => Some(SourceFormat::Xml),
            _ => None,
        }
    }
}

/// Where a pipeline run writes its output and its audit trail.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub log_target: PathBuf,
    pub output_path: PathBuf,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            log_target: PathBuf::from("log_file.txt"),
            output_path: PathBuf::from("transformed_data.csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_keep_a_fractional_digit() {
        assert_eq!(Value::Float(20000.0).to_string(), "20000.0");
        assert_eq!(Value::Float(15000.01).to_string(), "15000.01");
        assert_eq!(Value::Int(2015).to_string(), "2015");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn large_and_special_floats_still_read_as_floats() {
        assert_eq!(Value::Float(1e16).to_string(), "1e16");
        assert_eq!(Value::Float(-2.5e20).to_string(), "-2.5e20");
        assert_eq!(Value::Float(f64::NAN).to_string(), "");
        for v in [1e16, -2.5e20, 123456789012345680000.0] {
            let text = Value::Float(v).to_string();
            assert!(text.parse::<i64>().is_err(), "{text}");
            assert_eq!(text.parse::<f64>().unwrap(), v);
        }
    }

    #[test]
    fn push_row_aligns_to_columns() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![Value::Int(1)]);
        table.push_row(vec![Value::Int(2), Value::Int(3), Value::Int(4)]);
        assert_eq!(table.rows()[0], vec![Value::Int(1), Value::Null]);
        assert_eq!(table.rows()[1], vec![Value::Int(2), Value::Int(3)]);
        assert_eq!(table.get(1, "b"), Some(&Value::Int(3)));
        assert_eq!(table.get(0, "c"), None);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("cars.CSV")),
            Some(SourceFormat::Csv)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("dir/cars.json")),
            Some(SourceFormat::Json)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("cars.xml")),
            Some(SourceFormat::Xml)
        );
        assert_eq!(SourceFormat::from_path(Path::new("cars.parquet")), None);
        assert_eq!(SourceFormat::from_path(Path::new("cars")), None);
    }
}
