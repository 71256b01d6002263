//! Buildbot perf dashboard output
//!
//! For each value name, in sorted order, prints one `<chart>_by_url` line per
//! page followed by the value merged across pages. Summary values and the
//! failed/errored page counters come last.

use super::perf_result::{format_pages, format_perf_result};
use super::ResultsFormatter;
use crate::merge_values;
use crate::results::PageMeasurementResults;
use crate::value::{BuildbotValue, MeasurementValue, OutputContext, Value};
use crate::Result;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use tracing::debug;

const COUNTERS_MEASUREMENT: &str = "telemetry_page_measurement_results";

/// Writes results in the buildbot perf dashboard format
pub struct BuildbotFormatter<W: Write> {
    writer: W,
    trace_tag: String,
}

impl<W: Write> BuildbotFormatter<W> {
    /// A non-empty `trace_tag` is appended to every merged trace name and
    /// suppresses per-page lines.
    pub fn new(writer: W, trace_tag: impl Into<String>) -> Self {
        Self {
            writer,
            trace_tag: trace_tag.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn print_perf_result(
        &mut self,
        measurement: &str,
        trace: &str,
        value: &BuildbotValue,
        units: &str,
        result_type: &str,
    ) -> Result<()> {
        let line = format_perf_result(measurement, trace, value, units, result_type)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    fn print_per_page_results(&mut self, results: &PageMeasurementResults) -> Result<()> {
        let successful = results.all_page_specific_values_for_successful_pages();

        // Counted before same-page merging, so a page that ran twice counts twice.
        let mut num_values_for_value_name: HashMap<&str, usize> = HashMap::new();
        for v in &successful {
            *num_values_for_value_name.entry(v.name()).or_default() += 1;
        }

        // A page may have run more than once, so collapse repeats first.
        let merged_page_values = merge_values::merge_like_values_from_same_page(&successful)?;
        let mut per_page_values_by_name: HashMap<&str, Vec<&Value>> = HashMap::new();
        for value in &merged_page_values {
            per_page_values_by_name
                .entry(value.name())
                .or_default()
                .push(value);
        }

        let merged_pages_values =
            merge_values::merge_like_values_from_different_pages(&successful, false)?;
        let merged_pages_value_by_name: HashMap<&str, &Value> = merged_pages_values
            .iter()
            .map(|v| (v.name(), v))
            .collect();

        let sorted_value_names: BTreeSet<&str> =
            merged_page_values.iter().map(|v| v.name()).collect();
        debug!(names = sorted_value_names.len(), "Printing per-page results");

        for value_name in sorted_value_names {
            let mut per_page_values = per_page_values_by_name
                .remove(value_name)
                .unwrap_or_default();
            per_page_values.sort_by(|a, b| {
                let a = a.page().map(|p| p.display_name.as_str());
                let b = b.page().map(|p| p.display_name.as_str());
                a.cmp(&b)
            });

            let num_values = num_values_for_value_name
                .get(value_name)
                .copied()
                .unwrap_or_default();
            for value in per_page_values {
                self.print_per_page_value(value, num_values, results.had_errors_or_failures())?;
            }

            if let Some(merged) = merged_pages_value_by_name.get(value_name) {
                self.print_merged_pages_value(merged, results.had_errors_or_failures())?;
            }
        }
        Ok(())
    }

    fn print_per_page_value(
        &mut self,
        value: &Value,
        num_successful_values: usize,
        had_errors_or_failures: bool,
    ) -> Result<()> {
        if !self.trace_tag.is_empty() {
            return Ok(());
        }

        // A single run of a single page is already covered by the merged line.
        let should_print = num_successful_values > 1
            || (had_errors_or_failures && num_successful_values == 1);
        if !should_print {
            return Ok(());
        }

        let (measurement, trace) = value
            .meta()
            .buildbot_measurement_and_trace_name_for_per_page_result()?;
        self.print_perf_result(
            &measurement,
            &trace,
            &value.buildbot_value(),
            value.units(),
            value.buildbot_data_type(OutputContext::PerPageResult),
        )
    }

    fn print_merged_pages_value(
        &mut self,
        value: &Value,
        had_errors_or_failures: bool,
    ) -> Result<()> {
        if had_errors_or_failures {
            return Ok(());
        }

        let (measurement, trace) = value
            .meta()
            .buildbot_measurement_and_trace_name_for_merged_pages_result(&self.trace_tag);
        self.print_perf_result(
            &measurement,
            &trace,
            &value.buildbot_value(),
            value.units(),
            value.buildbot_data_type(OutputContext::MergedPagesResult),
        )
    }

    fn print_overall_results(&mut self, results: &PageMeasurementResults) -> Result<()> {
        if !results.had_errors_or_failures() {
            for value in results.summary_values() {
                let (measurement, trace) = value
                    .meta()
                    .buildbot_measurement_and_trace_name_for_merged_pages_result(&self.trace_tag);
                self.print_perf_result(
                    &measurement,
                    &trace,
                    &value.buildbot_value(),
                    value.units(),
                    value.buildbot_data_type(OutputContext::SummaryResult),
                )?;
            }
        }

        let num_failed = results.failures().len() as f64;
        let num_errored = results.errors().len() as f64;
        self.print_perf_result(
            COUNTERS_MEASUREMENT,
            "num_failed",
            &BuildbotValue::Samples(vec![num_failed]),
            "count",
            "unimportant",
        )?;
        self.print_perf_result(
            COUNTERS_MEASUREMENT,
            "num_errored",
            &BuildbotValue::Samples(vec![num_errored]),
            "count",
            "unimportant",
        )
    }
}

impl<W: Write> ResultsFormatter for BuildbotFormatter<W> {
    /// Print everything, in dashboard order
    ///
    /// When any page failed or errored, merged and summary lines are left
    /// out because they would mix in partial data.
    fn print_summary(&mut self, results: &PageMeasurementResults) -> Result<()> {
        let page_names: Vec<&str> = results
            .pages_that_succeeded()
            .into_iter()
            .map(|p| p.display_name.as_str())
            .collect();
        writeln!(self.writer, "{}", format_pages(&page_names))?;

        self.print_per_page_results(results)?;
        self.print_overall_results(results)?;
        self.writer.flush()?;
        Ok(())
    }
}
