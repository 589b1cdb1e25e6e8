use crate::error::LoadError;
use crate::structs::Table;
use csv::Writer;
use std::{fs::File, path::Path};

/// Writes a table to a CSV file: a header row of column names, then one row
/// per record in table order.
///
/// Any existing file at `output_path` is overwritten. Integral floats keep a
/// trailing `.0` and empty cells are written as empty fields.
///
/// # Arguments
/// * `table` - Table to serialize
/// * `output_path` - Path where the CSV file will be created
///
/// # Errors
/// Returns `LoadError` if the file cannot be created or written to.
pub fn write_csv(table: &Table, output_path: &Path) -> Result<(), LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: output_path.to_path_buf(),
        source,
    };

    let file = File::create(output_path).map_err(|source| LoadError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(table.columns()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|value| value.to_string()))
            .map_err(csv_err)?;
    }

    writer.flush().map_err(|source| LoadError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;
    Ok(())
}
