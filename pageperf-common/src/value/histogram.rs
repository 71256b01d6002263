//! Histogram values
//!
//! Histograms are reported as JSON with a fixed key order, because
//! dashboard consumers compare the rendered strings for equality.

use super::{BuildbotValue, MeasurementValue, OutputContext, ValueKind, ValueMeta};
use crate::page::Page;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One histogram bucket covering `[low, high)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub low: i64,
    pub high: i64,
    #[serde(default)]
    pub count: u64,
}

impl HistogramBucket {
    fn to_json_string(self) -> String {
        format!(
            "{{\"low\": {}, \"high\": {}, \"count\": {}}}",
            self.low, self.high, self.count
        )
    }

    fn midpoint(&self) -> f64 {
        (self.low as f64 + self.high as f64) / 2.0
    }
}

#[derive(Deserialize)]
struct RawHistogram {
    buckets: Vec<HistogramBucket>,
}

/// A bucketed distribution recorded on a page
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramValue {
    meta: ValueMeta,
    buckets: Vec<HistogramBucket>,
}

impl HistogramValue {
    pub fn new(
        page: Option<Page>,
        name: impl Into<String>,
        units: impl Into<String>,
        buckets: Vec<HistogramBucket>,
        important: bool,
    ) -> Self {
        Self {
            meta: ValueMeta::new(page, name, units, important),
            buckets,
        }
    }

    /// Build a histogram from its JSON form, `{"buckets": [...]}`
    pub fn from_json(
        page: Option<Page>,
        name: impl Into<String>,
        units: impl Into<String>,
        raw_value_json: &str,
        important: bool,
    ) -> Result<Self> {
        let name = name.into();
        let raw: RawHistogram = serde_json::from_str(raw_value_json).map_err(|e| {
            Error::precondition(format!("Histogram '{}' is not valid: {}", name, e))
        })?;
        Ok(Self::new(page, name, units, raw.buckets, important))
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    /// Stable JSON rendering: `{"buckets": [{"low": .., "high": .., "count": ..}]}`
    pub fn to_json_string(&self) -> String {
        let buckets: Vec<String> = self.buckets.iter().map(|b| b.to_json_string()).collect();
        format!("{{\"buckets\": [{}]}}", buckets.join(", "))
    }

    /// Histograms cannot be combined, so the first run stands for the page
    pub fn merge_like_values_from_same_page(values: &[HistogramValue]) -> Result<Self> {
        let (v0, rest) = values
            .split_first()
            .ok_or_else(|| Error::precondition("Cannot merge an empty list of histograms"))?;
        for v in rest {
            v0.meta.check_alike(&v.meta, true, false)?;
        }
        debug!(name = %v0.meta.name, inputs = values.len(), "Picked first histogram for page");
        Ok(v0.clone())
    }

    /// Histograms are not merged across pages
    ///
    /// Always `Ok(None)` for a non-empty input, which tells grouping code
    /// to leave the name out of the merged results.
    pub fn merge_like_values_from_different_pages(
        values: &[HistogramValue],
        _group_by_name_suffix: bool,
    ) -> Result<Option<Self>> {
        if values.is_empty() {
            return Err(Error::precondition("Cannot merge an empty list of histograms"));
        }
        Ok(None)
    }
}

/// Geometric mean and standard deviation of bucket midpoints, weighted by count
///
/// Buckets whose midpoint is not positive are ignored. Returns `(0.0, 0.0)`
/// when nothing is counted.
pub fn geom_mean_and_std_dev(buckets: &[HistogramBucket]) -> (f64, f64) {
    let mut count = 0u64;
    let mut sum_of_logs = 0.0;
    for bucket in buckets {
        let mean = bucket.midpoint();
        if mean > 0.0 {
            sum_of_logs += mean.ln() * bucket.count as f64;
            count += bucket.count;
        }
    }
    if count == 0 {
        return (0.0, 0.0);
    }

    let geom_mean = (sum_of_logs / count as f64).exp();
    let sum_of_squares: f64 = buckets
        .iter()
        .filter(|b| b.midpoint() > 0.0)
        .map(|b| (b.midpoint() - geom_mean).powi(2) * b.count as f64)
        .sum();
    (geom_mean, (sum_of_squares / count as f64).sqrt())
}

/// Same as [`geom_mean_and_std_dev`], from the JSON form
///
/// JSON without a `buckets` list yields `(0.0, 0.0)`.
pub(crate) fn geom_mean_and_std_dev_from_json(histogram_json: &str) -> (f64, f64) {
    match serde_json::from_str::<RawHistogram>(histogram_json) {
        Ok(raw) => geom_mean_and_std_dev(&raw.buckets),
        Err(_) => (0.0, 0.0),
    }
}

impl MeasurementValue for HistogramValue {
    fn meta(&self) -> &ValueMeta {
        &self.meta
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Histogram
    }

    fn representative_number(&self) -> f64 {
        geom_mean_and_std_dev(&self.buckets).0
    }

    fn representative_string(&self) -> String {
        self.to_json_string()
    }

    fn buildbot_data_type(&self, output_context: OutputContext) -> &'static str {
        if self.meta.is_important_given_output_context(output_context) {
            "histogram"
        } else {
            "unimportant-histogram"
        }
    }

    fn buildbot_value(&self) -> BuildbotValue {
        BuildbotValue::Histogram(self.to_json_string())
    }
}
