//! Replays a run file through the results store and a formatter

use crate::input::RunFile;
use pageperf_common::config::{OutputFormat, ReportConfig};
use pageperf_common::output::ResultsFormatter;
use pageperf_common::{Error, PageMeasurementResults, Result};
use tracing::{debug, info};

/// Settings given on the command line; each one replaces the config file's
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub format: Option<String>,
    pub trace_tag: Option<String>,
    pub output_after_every_page: bool,
    pub group_by_name_suffix: bool,
}

impl CliOverrides {
    /// Apply over `config` and validate the result
    pub fn apply(self, mut config: ReportConfig) -> Result<ReportConfig> {
        if let Some(format) = self.format {
            config.output_format = OutputFormat::from_str(&format).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown output format '{}', expected buildbot, csv or json",
                    format
                ))
            })?;
        }
        if let Some(trace_tag) = self.trace_tag {
            config.trace_tag = trace_tag;
        }
        if self.output_after_every_page {
            config.output_after_every_page = true;
        }
        if self.group_by_name_suffix {
            config.group_by_name_suffix = true;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Record every page run and summary value, then print the summary
///
/// Returns the filled results store so callers can inspect it.
pub fn run_report(
    run: &RunFile,
    formatter: &mut dyn ResultsFormatter,
) -> Result<PageMeasurementResults> {
    let mut results = PageMeasurementResults::new();

    for page_run in &run.pages {
        let page = page_run.page();
        results.will_measure_page(page.clone())?;
        for raw in &page_run.values {
            results.add(raw.to_value(Some(&page))?)?;
        }
        formatter.did_measure_page(&results)?;
        results.did_measure_page()?;

        if let Some(message) = &page_run.failure {
            results.add_failure(page.clone(), message.as_str());
        }
        if let Some(message) = &page_run.error {
            results.add_error(page, message.as_str());
        }
    }

    for raw in &run.summary_values {
        results.add_summary(raw.to_value(None)?)?;
    }

    debug!(
        page_values = results.all_page_specific_values().len(),
        summary_values = results.summary_values().len(),
        "All pages recorded"
    );
    formatter.print_summary(&results)?;

    info!(
        pages = run.pages.len(),
        failures = results.failures().len(),
        errors = results.errors().len(),
        "Report written"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config() {
        let config = ReportConfig::default();
        let overrides = CliOverrides {
            format: Some("csv".to_string()),
            trace_tag: Some("_ref".to_string()),
            output_after_every_page: true,
            group_by_name_suffix: true,
        };

        let config = overrides.apply(config).unwrap();
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.trace_tag, "_ref");
        assert!(config.output_after_every_page);
        assert!(config.group_by_name_suffix);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let config = ReportConfig {
            output_format: OutputFormat::Json,
            trace_tag: "_tag".to_string(),
            ..Default::default()
        };

        let applied = CliOverrides::default().apply(config.clone()).unwrap();
        assert_eq!(applied, config);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let overrides = CliOverrides {
            format: Some("xml".to_string()),
            ..Default::default()
        };
        assert!(overrides.apply(ReportConfig::default()).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = ReportConfig::default();
        config.logging.level = "loud".to_string();

        let err = CliOverrides::default().apply(config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
