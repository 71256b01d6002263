//! Result formatters
//!
//! A formatter watches a [`PageMeasurementResults`] as pages finish and
//! prints the collected values when the run is over.

mod buildbot;
mod csv;
mod json;
pub mod perf_result;

pub use self::buildbot::BuildbotFormatter;
pub use self::csv::CsvFormatter;
pub use self::json::{JsonFormatter, ValueRecord};

use crate::config::{OutputFormat, ReportConfig};
use crate::results::PageMeasurementResults;
use crate::Result;
use std::io::Write;

/// Prints page measurement results
pub trait ResultsFormatter {
    /// Called after the last value of a page was added, while the page is
    /// still the current page
    fn did_measure_page(&mut self, _results: &PageMeasurementResults) -> Result<()> {
        Ok(())
    }

    /// Called once when every page has been measured
    fn print_summary(&mut self, results: &PageMeasurementResults) -> Result<()>;
}

/// Build the formatter `config` asks for, writing to `writer`
pub fn formatter_for<'a, W: Write + 'a>(
    config: &ReportConfig,
    writer: W,
) -> Box<dyn ResultsFormatter + 'a> {
    match config.output_format {
        OutputFormat::Buildbot => {
            Box::new(BuildbotFormatter::new(writer, config.trace_tag.clone()))
        }
        OutputFormat::Csv => Box::new(CsvFormatter::new(writer, config.output_after_every_page)),
        OutputFormat::Json => Box::new(JsonFormatter::new(writer, config.group_by_name_suffix)),
    }
}
