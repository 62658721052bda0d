//! `validate` command: check configuration files.
//!
//! Validates every file given, reports all issues for each, and fails
//! if any file is unusable. Under `--strict`, warnings count as
//! failures.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::{LoaderOptions, load_config};
use crate::error::{ConfigError, ProgressionError};

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    ok: bool,
    issues: Vec<String>,
}

/// Runs the `validate` command.
///
/// # Errors
///
/// Returns the first file's failure after reporting all files.
pub fn run(args: &ValidateArgs) -> Result<(), ProgressionError> {
    let options = LoaderOptions {
        strict: args.strict,
    };
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_failure = None;

    for path in &args.files {
        let report = check_file(path, options, &mut first_failure);
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Human => {
            for report in &reports {
                let status = if report.ok { "ok" } else { "FAILED" };
                println!("{}: {status}", report.path);
                for issue in &report.issues {
                    println!("  {issue}");
                }
            }
        }
    }

    first_failure.map_or(Ok(()), Err)
}

fn check_file(
    path: &Path,
    options: LoaderOptions,
    first_failure: &mut Option<ProgressionError>,
) -> FileReport {
    let display = path.display().to_string();
    match load_config(path, options) {
        Ok(result) => FileReport {
            path: display,
            ok: true,
            issues: result.warnings.iter().map(ToString::to_string).collect(),
        },
        Err(err) => {
            let issues = match &err {
                ProgressionError::Config(ConfigError::ValidationError { errors, .. }) => {
                    errors.iter().map(ToString::to_string).collect()
                }
                other => vec![other.to_string()],
            };
            if first_failure.is_none() {
                *first_failure = Some(err);
            }
            FileReport {
                path: display,
                ok: false,
                issues,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::EngineConfig;
    use crate::profile::TriggerKind;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn args(files: Vec<std::path::PathBuf>, strict: bool) -> ValidateArgs {
        ValidateArgs {
            files,
            format: OutputFormat::Json,
            strict,
        }
    }

    #[test]
    fn test_valid_file_passes() {
        let yaml = serde_yaml::to_string(&EngineConfig::builtin()).unwrap();
        let file = write_config(&yaml);
        run(&args(vec![file.path().to_path_buf()], false)).unwrap();
    }

    #[test]
    fn test_invalid_file_fails() {
        let mut config = EngineConfig::builtin();
        config
            .triggers
            .get_mut(&TriggerKind::new("criticism"))
            .unwrap()
            .patterns = vec!["[bad".to_string()];
        let yaml = serde_yaml::to_string(&config).unwrap();
        let file = write_config(&yaml);
        assert!(run(&args(vec![file.path().to_path_buf()], false)).is_err());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(run(&args(vec!["/nonexistent.yaml".into()], false)).is_err());
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let mut config = EngineConfig::builtin();
        config
            .triggers
            .get_mut(&TriggerKind::new("criticism"))
            .unwrap()
            .weight = 1.5;
        let yaml = serde_yaml::to_string(&config).unwrap();
        let file = write_config(&yaml);
        assert!(run(&args(vec![file.path().to_path_buf()], false)).is_ok());
        assert!(run(&args(vec![file.path().to_path_buf()], true)).is_err());
    }

    #[test]
    fn test_all_files_are_checked() {
        let good = write_config(&serde_yaml::to_string(&EngineConfig::builtin()).unwrap());
        let result = run(&args(
            vec!["/nonexistent.yaml".into(), good.path().to_path_buf()],
            false,
        ));
        // First failure is returned after every file is reported.
        assert!(result.is_err());
    }
}
