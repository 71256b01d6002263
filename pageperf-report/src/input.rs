//! Recorded page runs, as read from a JSON file
//!
//! ```json
//! {
//!   "pages": [
//!     {"url": "http://www.bar.com/", "values": [
//!       {"type": "scalar", "name": "load", "chart": "timing", "units": "ms", "value": 12}
//!     ]},
//!     {"url": "http://www.baz.com/", "failure": "timed out"}
//!   ],
//!   "summary_values": []
//! }
//! ```
//!
//! A page may appear more than once; each entry is one run of that page.

use pageperf_common::value::naming::value_name_from_trace_and_chart_name;
use pageperf_common::value::HistogramBucket;
use pageperf_common::{
    Error, HistogramValue, ListOfScalarValues, MergePolicy, Page, Result, ScalarValue, Value,
};
use serde::Deserialize;
use std::path::Path;

/// The whole run file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub pages: Vec<PageRun>,
    #[serde(default)]
    pub summary_values: Vec<RawValue>,
}

/// One run of one page
#[derive(Debug, Clone, Deserialize)]
pub struct PageRun {
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub values: Vec<RawValue>,
    /// The page failed a check; its values are kept out of merged output
    #[serde(default)]
    pub failure: Option<String>,
    /// The page could not be run
    #[serde(default)]
    pub error: Option<String>,
}

impl PageRun {
    pub fn page(&self) -> Page {
        match &self.display_name {
            Some(display_name) => Page::with_display_name(self.url.clone(), display_name.clone()),
            None => Page::new(self.url.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    Scalar,
    ListOfScalarValues,
    Histogram,
}

/// A value record before validation
///
/// Samples stay untyped JSON here so that a non-numeric sample is reported
/// as a bad value instead of a parse error for the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawValue {
    #[serde(rename = "type")]
    pub kind: RawKind,
    pub name: String,
    #[serde(default)]
    pub chart: Option<String>,
    pub units: String,
    #[serde(default = "default_important")]
    pub important: bool,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub buckets: Option<Vec<HistogramBucket>>,
    #[serde(default)]
    pub same_page_merge_policy: Option<MergePolicy>,
}

fn default_important() -> bool {
    true
}

impl RawValue {
    /// Validate the record and build a value on `page`
    pub fn to_value(&self, page: Option<&Page>) -> Result<Value> {
        let name = value_name_from_trace_and_chart_name(&self.name, self.chart.as_deref())?;
        let page = page.cloned();

        Ok(match self.kind {
            RawKind::Scalar => {
                let raw = self.value.as_ref().ok_or_else(|| missing_field(&name, "value"))?;
                let value = sample(&name, raw)?;
                ScalarValue::new(page, name.as_str(), self.units.as_str(), value, self.important)?
                    .into()
            }
            RawKind::ListOfScalarValues => {
                let raw = self.values.as_ref().ok_or_else(|| missing_field(&name, "values"))?;
                let samples = raw
                    .iter()
                    .map(|v| sample(&name, v))
                    .collect::<Result<Vec<f64>>>()?;
                ListOfScalarValues::new(
                    page,
                    name.as_str(),
                    self.units.as_str(),
                    samples,
                    self.important,
                    self.same_page_merge_policy.unwrap_or_default(),
                )?
                .into()
            }
            RawKind::Histogram => {
                let buckets = self.buckets.clone().ok_or_else(|| missing_field(&name, "buckets"))?;
                let units = self.units.as_str();
                HistogramValue::new(page, name.as_str(), units, buckets, self.important).into()
            }
        })
    }
}

fn missing_field(name: &str, field: &str) -> Error {
    Error::precondition(format!("Value '{}' is missing '{}'", name, field))
}

fn sample(name: &str, raw: &serde_json::Value) -> Result<f64> {
    raw.as_f64().ok_or_else(|| {
        Error::precondition(format!(
            "Value '{}' has a non-numeric sample: {}",
            name, raw
        ))
    })
}

/// Read and parse a run file
pub fn load_run_file(path: &Path) -> Result<RunFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
