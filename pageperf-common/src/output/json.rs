//! JSON report output

use super::ResultsFormatter;
use crate::merge_values;
use crate::results::{PageMeasurementResults, PageProblem};
use crate::value::{BuildbotValue, MeasurementValue, MergePolicy, OutputContext, Value};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// One value as it appears in the JSON report
#[derive(Debug, Serialize)]
pub struct ValueRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub name: String,
    pub units: String,
    pub important: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub buildbot_data_type: &'static str,
    pub representative_number: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_page_merge_policy: Option<MergePolicy>,
}

impl ValueRecord {
    fn from_value(value: &Value, output_context: OutputContext) -> Self {
        let (values, histogram) = match value.buildbot_value() {
            BuildbotValue::Samples(samples) => (Some(samples), None),
            BuildbotValue::Histogram(json) => (None, Some(json)),
        };
        Self {
            page: value.page().map(|p| p.url.clone()),
            name: value.name().to_string(),
            units: value.units().to_string(),
            important: value.important(),
            kind: value.kind().as_str(),
            buildbot_data_type: value.buildbot_data_type(output_context),
            representative_number: value.representative_number(),
            values,
            histogram,
            same_page_merge_policy: value.as_list().map(|l| l.same_page_merge_policy()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProblemRecord<'a> {
    page: &'a str,
    message: &'a str,
}

impl<'a> From<&'a PageProblem> for ProblemRecord<'a> {
    fn from(p: &'a PageProblem) -> Self {
        Self {
            page: &p.page.url,
            message: &p.message,
        }
    }
}

/// The whole JSON report
#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    pages: Vec<&'a str>,
    per_page_values: Vec<ValueRecord>,
    merged_pages_values: Vec<ValueRecord>,
    summary_values: Vec<ValueRecord>,
    failures: Vec<ProblemRecord<'a>>,
    errors: Vec<ProblemRecord<'a>>,
}

/// Writes a single JSON document summarizing the run
///
/// Per-page values are merged within each page and merged-pages values span
/// successful pages only.
pub struct JsonFormatter<W: Write> {
    writer: W,
    group_by_name_suffix: bool,
}

impl<W: Write> JsonFormatter<W> {
    pub fn new(writer: W, group_by_name_suffix: bool) -> Self {
        Self {
            writer,
            group_by_name_suffix,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultsFormatter for JsonFormatter<W> {
    fn print_summary(&mut self, results: &PageMeasurementResults) -> Result<()> {
        let successful = results.all_page_specific_values_for_successful_pages();
        let per_page = merge_values::merge_like_values_from_same_page(&successful)?;
        let merged_pages = merge_values::merge_like_values_from_different_pages(
            &successful,
            self.group_by_name_suffix,
        )?;

        let report = Report {
            generated_at: Utc::now(),
            pages: results
                .pages_that_succeeded()
                .into_iter()
                .map(|p| p.url.as_str())
                .collect(),
            per_page_values: per_page
                .iter()
                .map(|v| ValueRecord::from_value(v, OutputContext::PerPageResult))
                .collect(),
            merged_pages_values: merged_pages
                .iter()
                .map(|v| ValueRecord::from_value(v, OutputContext::MergedPagesResult))
                .collect(),
            summary_values: results
                .summary_values()
                .iter()
                .map(|v| ValueRecord::from_value(v, OutputContext::SummaryResult))
                .collect(),
            failures: results.failures().iter().map(ProblemRecord::from).collect(),
            errors: results.errors().iter().map(ProblemRecord::from).collect(),
        };

        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
