use crate::audit::AuditLog;
use crate::error::Result;
use crate::extract::Extractor;
use crate::load::write_csv;
use crate::structs::EtlConfig;
use crate::transform::{Transformed, transform};
use log::{debug, error, info, warn};
use std::path::Path;

/// Lifecycle of a single pipeline run. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Completed,
    Failed,
}

/// State of one in-flight run: where it reads from, where it writes, and
/// which [`Stage`] it has reached.
struct PipelineRun<'a> {
    source: &'a Path,
    config: &'a EtlConfig,
    audit: AuditLog,
    stage: Stage,
}

impl PipelineRun<'_> {
    /// Moves the run to `stage`, tracing the transition at debug level.
    fn enter(&mut self, stage: Stage) {
        debug!(
            "{}: {:?} -> {:?}",
            self.source.display(),
            self.stage,
            stage
        );
        self.stage = stage;
    }

    /// Runs every stage in order, recording each step in the audit log.
    ///
    /// # Arguments
    ///
    /// * `extractor` - Reader for the source file's format
    ///
    /// # Returns
    ///
    /// `Ok(())` once the completion entry has been written. `self.stage` is
    /// left at the stage that was running when an error occurred.
    ///
    /// # Errors
    ///
    /// Returns the first `PipelineError` raised by a stage or by an audit
    /// write; the remaining stages are skipped.
    fn execute(&mut self, extractor: Extractor) -> Result<()> {
        self.audit
            .record(&format!("Started extraction from {}", self.source.display()))?;
        self.enter(Stage::Extracting);
        let table = extractor(self.source)?;
        self.audit.record(&format!(
            "Extraction successful: {} records loaded",
            table.len()
        ))?;

        self.enter(Stage::Transforming);
        let Transformed {
            table,
            price_rounded,
        } = transform(table)?;
        if price_rounded {
            self.audit
                .record("Transformation applied: price rounded to 2 decimals")?;
        } else {
            self.audit
                .record("Transformation skipped: no price column present")?;
        }

        self.enter(Stage::Loading);
        let output = &self.config.output_path;
        write_csv(&table, output)?;
        self.audit.record(&format!(
            "Loading successful: data saved to {}",
            output.display()
        ))?;

        self.audit.record("ETL process completed successfully")?;
        self.enter(Stage::Completed);
        Ok(())
    }
}

/// Runs extract, transform and load for one source file.
///
/// Progress is appended to the audit log at `config.log_target` and the
/// table is written to `config.output_path`, replacing any previous output.
/// This function never fails: any stage error, including a failure to write
/// the audit log itself, stops the run and is recorded as a single
/// `ETL process failed: <message>` entry. When even that entry cannot be
/// written the failure is reported through the `log` facade instead.
pub fn run(source: &Path, extractor: Extractor, config: &EtlConfig) {
    let mut pipeline = PipelineRun {
        source,
        config,
        audit: AuditLog::new(&config.log_target),
        stage: Stage::Idle,
    };

    match pipeline.execute(extractor) {
        Ok(()) => info!("ETL for {} completed", source.display()),
        Err(err) => {
            warn!(
                "ETL for {} failed during {:?}: {}",
                source.display(),
                pipeline.stage,
                err
            );
            pipeline.enter(Stage::Failed);
            let message = format!("ETL process failed: {err}");
            if let Err(audit_err) = pipeline.audit.record(&message) {
                error!("{audit_err}; dropped audit entry: {message}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::structs::{Table, Value};
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> EtlConfig {
        EtlConfig {
            log_target: dir.path().join("log_file.txt"),
            output_path: dir.path().join("transformed_data.csv"),
        }
    }

    fn audit_messages(config: &EtlConfig) -> Vec<String> {
        fs::read_to_string(&config.log_target)
            .unwrap()
            .lines()
            .map(|line| line.split_once("] ").unwrap().1.to_string())
            .collect()
    }

    fn priced_table(_: &Path) -> std::result::Result<Table, ExtractionError> {
        let mut table = Table::new(vec!["car_model".into(), "price".into()]);
        table.push_row(vec![Value::from("ritz"), Value::Float(19999.999)]);
        Ok(table)
    }

    fn unpriced_table(_: &Path) -> std::result::Result<Table, ExtractionError> {
        let mut table = Table::new(vec!["car_model".into()]);
        table.push_row(vec![Value::from("ritz")]);
        Ok(table)
    }

    fn failing_extractor(path: &Path) -> std::result::Result<Table, ExtractionError> {
        Err(ExtractionError::MissingField {
            path: path.to_path_buf(),
            record: 1,
            field: "fuel",
        })
    }

    #[test]
    fn successful_run_writes_full_audit_trail() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        run(Path::new("cars.csv"), priced_table, &config);

        assert_eq!(
            audit_messages(&config),
            vec![
                "Started extraction from cars.csv".to_string(),
                "Extraction successful: 1 records loaded".to_string(),
                "Transformation applied: price rounded to 2 decimals".to_string(),
                format!(
                    "Loading successful: data saved to {}",
                    config.output_path.display()
                ),
                "ETL process completed successfully".to_string(),
            ]
        );
        assert_eq!(
            fs::read_to_string(&config.output_path).unwrap(),
            "car_model,price\nritz,20000.0\n"
        );
    }

    #[test]
    fn missing_price_logs_skip() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        run(Path::new("cars.json"), unpriced_table, &config);

        let messages = audit_messages(&config);
        assert_eq!(messages[2], "Transformation skipped: no price column present");
        assert!(!messages.iter().any(|m| m.contains("rounded")));
        assert_eq!(
            fs::read_to_string(&config.output_path).unwrap(),
            "car_model\nritz\n"
        );
    }

    #[test]
    fn extraction_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.output_path, "previous output\n").unwrap();

        run(Path::new("cars.xml"), failing_extractor, &config);

        let messages = audit_messages(&config);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Started extraction from cars.xml");
        assert_eq!(
            messages[1],
            "ETL process failed: cars.xml: record 1 has no <fuel> element"
        );
        assert_eq!(
            fs::read_to_string(&config.output_path).unwrap(),
            "previous output\n"
        );
    }

    #[test]
    fn load_failure_is_recorded() {
        let dir = TempDir::new().unwrap();
        let config = EtlConfig {
            output_path: dir.path().join("missing").join("out.csv"),
            ..config_in(&dir)
        };

        run(Path::new("cars.csv"), priced_table, &config);

        let messages = audit_messages(&config);
        assert_eq!(messages.len(), 4);
        assert!(messages[3].starts_with("ETL process failed: cannot write"));
    }

    #[test]
    fn unwritable_audit_log_does_not_escape() {
        let dir = TempDir::new().unwrap();
        let config = EtlConfig {
            log_target: dir.path().join("missing").join("log.txt"),
            ..config_in(&dir)
        };

        run(Path::new("cars.csv"), priced_table, &config);

        assert!(!config.log_target.exists());
        assert!(!config.output_path.exists());
    }
}
