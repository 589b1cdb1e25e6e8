use crate::error::ExtractionError;
use crate::structs::{SourceFormat, Table, Value};
use crate::transform::round_to_cents;
use csv::ReaderBuilder;
use log::debug;
use roxmltree::{Document, Node, ParsingOptions};
use serde_json::Value as JsonValue;
use std::{collections::HashMap, fs, fs::File, path::Path};

/// Signature shared by every extractor.
pub type Extractor = fn(&Path) -> Result<Table, ExtractionError>;

/// Cell contents read as a missing value, matching the dataframe reader's
/// default NA markers.
pub const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Child elements every XML car listing must carry, in output column order.
pub const CAR_FIELDS: [&str; 4] = ["car_model", "year_of_manufacture", "price", "fuel"];

impl SourceFormat {
    /// The extractor that reads this format.
    pub fn extractor(self) -> Extractor {
        match self {
            SourceFormat::Csv => extract_csv,
            SourceFormat::Json => extract_json,
            SourceFormat::Xml => extract_xml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Reads a delimited-text file whose first row names the columns.
///
/// Column types are inferred from the data: a column whose non-empty cells
/// all parse as integers becomes [`Value::Int`], one whose cells all parse
/// as numbers becomes [`Value::Float`], anything else stays text. Empty
/// cells and the markers in [`MISSING_MARKERS`] become [`Value::Null`] and
/// take no part in the inference.
///
/// # Errors
///
/// Returns `ExtractionError` if the file cannot be opened, has no header,
/// or contains rows that do not parse as CSV (including ragged rows).
pub fn extract_csv(path: &Path) -> Result<Table, ExtractionError> {
    debug!("Reading CSV file: {}", path.display());
    let csv_err = |source: csv::Error| ExtractionError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.is_empty() {
        return Err(ExtractionError::NoColumns {
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.map_err(csv_err)?);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|col| infer_kind(records.iter().filter_map(|r| r.get(col))))
        .collect();
    debug!("Inferred column kinds for {}: {:?}", path.display(), kinds);

    let mut table = Table::new(columns);
    for record in &records {
        let row = record
            .iter()
            .zip(&kinds)
            .map(|(cell, kind)| convert_cell(cell, *kind))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

/// Returns true if a raw CSV cell stands for a missing value.
fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Infers the narrowest kind that fits every present cell of a column.
///
/// # Arguments
///
/// * `cells` - Raw cell text of one column, in row order
///
/// # Returns
///
/// `ColumnKind::Int` if every present cell parses as `i64`, `ColumnKind::Float`
/// if every present cell parses as `f64`, otherwise `ColumnKind::Text`. A
/// column with no present cells stays `ColumnKind::Int`; all its values come
/// out as [`Value::Null`] anyway.
fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    for cell in cells.filter(|c| !is_missing(c)).map(str::trim) {
        if kind == ColumnKind::Int && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    kind
}

/// Converts one raw CSV cell to a [`Value`] of the column's inferred kind.
///
/// # Arguments
///
/// * `cell` - Raw cell text
/// * `kind` - Kind inferred for the cell's column by [`infer_kind`]
///
/// # Returns
///
/// [`Value::Null`] for missing cells; otherwise a value of `kind`. Text cells
/// keep their surrounding whitespace.
fn convert_cell(cell: &str, kind: ColumnKind) -> Value {
    if is_missing(cell) {
        return Value::Null;
    }
    let trimmed = cell.trim();
    // Kinds were inferred from these same cells, so the parses succeed.
    match kind {
        ColumnKind::Int => trimmed.parse().map_or(Value::Null, Value::Int),
        ColumnKind::Float => trimmed.parse().map_or(Value::Null, Value::Float),
        ColumnKind::Text => Value::Str(cell.to_string()),
    }
}

/// Reads a JSON document of records.
///
/// Accepts a top-level array of objects, a single object, or a sequence of
/// concatenated / newline-delimited objects. Columns are ordered by first
/// appearance; a record lacking a key gets [`Value::Null`] there. Nested
/// arrays and objects are kept as their compact JSON text.
///
/// # Errors
///
/// Returns `ExtractionError` if the file cannot be read, is empty, does not
/// parse, or holds a top-level item that is not an object.
pub fn extract_json(path: &Path) -> Result<Table, ExtractionError> {
    debug!("Reading JSON file: {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut documents = 0;
    let mut items = Vec::new();
    for document in serde_json::Deserializer::from_str(&text).into_iter::<JsonValue>() {
        documents += 1;
        match document.map_err(|source| ExtractionError::Json {
            path: path.to_path_buf(),
            source,
        })? {
            JsonValue::Array(values) => items.extend(values),
            other => items.push(other),
        }
    }
    if documents == 0 {
        return Err(ExtractionError::NoColumns {
            path: path.to_path_buf(),
        });
    }

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let JsonValue::Object(map) = item else {
            return Err(ExtractionError::NotARecord {
                path: path.to_path_buf(),
                index: i,
            });
        };
        let mut cells = Vec::with_capacity(map.len());
        for (key, value) in map {
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                columns.push(key);
                columns.len() - 1
            });
            cells.push((idx, json_to_value(value)));
        }
        records.push(cells);
    }

    let mut table = Table::new(columns);
    let width = table.columns().len();
    for cells in records {
        let mut row = vec![Value::Null; width];
        for (idx, value) in cells {
            row[idx] = value;
        }
        table.push_row(row);
    }
    widen_mixed_numeric_columns(&mut table);
    Ok(table)
}

/// Maps one top-level JSON field to a table cell.
///
/// Integers that fit `i64` become [`Value::Int`], other numbers
/// [`Value::Float`]. Booleans are kept as their text, and nested arrays or
/// objects as their compact JSON text.
fn json_to_value(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Str(b.to_string()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        JsonValue::String(s) => Value::Str(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Str(nested.to_string()),
    }
}

/// Promotes integer cells to floats in columns that also hold floats.
fn widen_mixed_numeric_columns(table: &mut Table) {
    for idx in 0..table.columns().len() {
        let has_float = table
            .rows()
            .iter()
            .any(|r| matches!(r[idx], Value::Float(_)));
        if !has_float {
            continue;
        }
        for cell in table.column_mut(idx) {
            if let Value::Int(v) = *cell {
                *cell = Value::Float(v as f64);
            }
        }
    }
}

/// Reads an XML document whose root element's children are car listings.
///
/// Every listing must contain `car_model`, `year_of_manufacture`, `price` and
/// `fuel` child elements. The year is parsed as an integer and the price as a
/// float rounded to 2 decimals. Records are collected first and the table is
/// only built once the whole tree has been walked.
///
/// # Errors
///
/// Returns `ExtractionError` if the file cannot be read, is not well-formed
/// XML, or any listing is missing a field, has an empty field, or holds an
/// unparseable number. A single bad listing fails the whole file.
pub fn extract_xml(path: &Path) -> Result<Table, ExtractionError> {
    debug!("Reading XML file: {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(&text, options).map_err(|source| ExtractionError::Xml {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = doc
        .root_element()
        .children()
        .filter(Node::is_element)
        .enumerate()
        .map(|(i, node)| parse_car_listing(path, i + 1, node))
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::new(CAR_FIELDS.iter().map(|f| f.to_string()).collect());
    for row in rows {
        table.push_row(row);
    }
    Ok(table)
}

/// Parses one car listing element into a row in [`CAR_FIELDS`] order.
///
/// # Arguments
///
/// * `path` - Source file, used in error messages
/// * `record` - 1-based position of the listing under the root element
/// * `node` - The listing element
///
/// # Returns
///
/// The row `[car_model, year_of_manufacture, price, fuel]`, with the price
/// rounded to 2 decimals.
///
/// # Errors
///
/// Returns `ExtractionError::MissingField`, `EmptyField` or `InvalidField`
/// for the first field that is absent, empty or does not parse.
fn parse_car_listing(
    path: &Path,
    record: usize,
    node: Node<'_, '_>,
) -> Result<Vec<Value>, ExtractionError> {
    let invalid = |field: &'static str, value: &str, reason: String| ExtractionError::InvalidField {
        path: path.to_path_buf(),
        record,
        field,
        value: value.to_string(),
        reason,
    };

    let car_model = field_text(path, record, node, "car_model")?;
    let year = field_text(path, record, node, "year_of_manufacture")?;
    let year: i64 = year
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid("year_of_manufacture", year, e.to_string()))?;
    let price = field_text(path, record, node, "price")?;
    let price: f64 = price
        .parse()
        .map_err(|e: std::num::ParseFloatError| invalid("price", price, e.to_string()))?;
    let fuel = field_text(path, record, node, "fuel")?;

    Ok(vec![
        Value::from(car_model),
        Value::Int(year),
        Value::Float(round_to_cents(price)),
        Value::from(fuel),
    ])
}

/// Trimmed text of the first child element named `field`.
///
/// A missing element is `MissingField`; an element with no text, or only
/// whitespace, is `EmptyField`.
fn field_text<'a>(
    path: &Path,
    record: usize,
    node: Node<'a, '_>,
    field: &'static str,
) -> Result<&'a str, ExtractionError> {
    let child = node
        .children()
        .find(|c| c.is_element() && c.has_tag_name(field))
        .ok_or_else(|| ExtractionError::MissingField {
            path: path.to_path_buf(),
            record,
            field,
        })?;
    match child.text().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ExtractionError::EmptyField {
            path: path.to_path_buf(),
            record,
            field,
        }),
    }
}
