//! Measurement values
//!
//! A value is what a page measurement produces: a name, units, an importance
//! flag, an optional page and one of several payload kinds. Values are
//! immutable; every merge allocates a new value.
//!
//! A page may run several times in one session, and a page set spans many
//! pages. Consumers usually want one value per (page, name) and one summary
//! value per name, so each kind defines how like values from the same page
//! and from different pages combine:
//!
//! | Kind | Same page | Different pages |
//! |---|---|---|
//! | [`ScalarValue`] | list of all scalars | list of all scalars |
//! | [`ListOfScalarValues`] | per [`MergePolicy`] | concatenation |
//! | [`HistogramValue`] | first histogram | not mergeable |

pub mod naming;

mod histogram;
mod list_of_scalar_values;
mod scalar;

pub use histogram::{geom_mean_and_std_dev, HistogramBucket, HistogramValue};
pub(crate) use histogram::geom_mean_and_std_dev_from_json;
pub use list_of_scalar_values::ListOfScalarValues;
pub use scalar::ScalarValue;

use crate::page::Page;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How like values recorded on the same page are combined
///
/// It is sometimes ambiguous whether repeated measurements should be joined
/// or whether one should stand for all of them, so the producer decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MergePolicy {
    /// Join every sample, in input order
    #[default]
    #[serde(rename = "concatenate")]
    Concatenate,

    /// Keep only the first value's samples
    #[serde(rename = "pick-first")]
    PickFirst,
}

impl MergePolicy {
    /// Parse a policy from its canonical string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "concatenate" => Some(MergePolicy::Concatenate),
            "pick-first" | "pick_first" => Some(MergePolicy::PickFirst),
            _ => None,
        }
    }

    /// Canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Concatenate => "concatenate",
            MergePolicy::PickFirst => "pick-first",
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The context a value is being reported in
///
/// The same value is classified differently depending on whether it is
/// printed as one page's result, as the merged result of all pages, or as a
/// summary value that never had a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    PerPageResult,
    MergedPagesResult,
    SummaryResult,
}

/// Payload kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    ListOfScalarValues,
    Histogram,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::ListOfScalarValues => "list_of_scalar_values",
            ValueKind::Histogram => "histogram",
        }
    }
}

/// What a value hands to the buildbot perf printer
#[derive(Debug, Clone, PartialEq)]
pub enum BuildbotValue {
    /// Numeric samples
    Samples(Vec<f64>),
    /// A single histogram rendered as stable JSON
    Histogram(String),
}

/// Attributes shared by every value kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMeta {
    /// `None` for summary values and for values merged across pages
    pub page: Option<Page>,
    pub name: String,
    pub units: String,
    pub important: bool,
}

impl ValueMeta {
    pub fn new(
        page: Option<Page>,
        name: impl Into<String>,
        units: impl Into<String>,
        important: bool,
    ) -> Self {
        Self {
            page,
            name: name.into(),
            units: units.into(),
            important,
        }
    }

    /// The part of the name after the first `.`, or the full name
    pub fn name_suffix(&self) -> &str {
        naming::name_suffix(&self.name)
    }

    fn is_important_given_output_context(&self, output_context: OutputContext) -> bool {
        match output_context {
            OutputContext::PerPageResult => false,
            OutputContext::MergedPagesResult | OutputContext::SummaryResult => self.important,
        }
    }

    /// Buildbot (measurement, trace) names for a per-page result line
    ///
    /// The measurement gets a `_by_url` suffix and the trace is the page's
    /// display name, so this fails for values without a page.
    pub fn buildbot_measurement_and_trace_name_for_per_page_result(
        &self,
    ) -> Result<(String, String)> {
        let page = self.page.as_ref().ok_or_else(|| {
            Error::precondition(format!(
                "Value '{}' has no page and cannot be reported per page",
                self.name
            ))
        })?;
        let (measurement, _) = naming::buildbot_chart_and_trace_name(&self.name);
        Ok((format!("{}_by_url", measurement), page.display_name.clone()))
    }

    /// Buildbot (measurement, trace) names for a merged-pages or summary line
    pub fn buildbot_measurement_and_trace_name_for_merged_pages_result(
        &self,
        trace_tag: &str,
    ) -> (String, String) {
        let (measurement, trace) = naming::buildbot_chart_and_trace_name(&self.name);
        (measurement.to_string(), format!("{}{}", trace, trace_tag))
    }

    /// Check that `other` belongs in the same merge group as `self`
    ///
    /// Units and importance must always agree. Names must agree exactly, or
    /// only in their suffix when grouping by suffix. Pages must agree when
    /// merging within a page.
    pub(crate) fn check_alike(
        &self,
        other: &ValueMeta,
        same_page: bool,
        group_by_name_suffix: bool,
    ) -> Result<()> {
        let names_match = if group_by_name_suffix {
            self.name_suffix() == other.name_suffix()
        } else {
            self.name == other.name
        };
        if !names_match {
            return Err(Error::precondition(format!(
                "Cannot merge value '{}' with value '{}': names differ",
                other.name, self.name
            )));
        }
        if self.units != other.units {
            return Err(Error::precondition(format!(
                "Cannot merge value '{}': units '{}' differ from '{}'",
                other.name, other.units, self.units
            )));
        }
        if self.important != other.important {
            return Err(Error::precondition(format!(
                "Cannot merge value '{}': importance differs",
                other.name
            )));
        }
        if same_page && self.page != other.page {
            return Err(Error::precondition(format!(
                "Cannot merge value '{}' from the same page: pages differ",
                other.name
            )));
        }
        Ok(())
    }

    /// Name a cross-page merge result takes
    pub(crate) fn merged_name(&self, group_by_name_suffix: bool) -> String {
        if group_by_name_suffix {
            self.name_suffix().to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Capabilities every value kind provides for merging and reporting
pub trait MeasurementValue {
    fn meta(&self) -> &ValueMeta;

    fn kind(&self) -> ValueKind;

    fn page(&self) -> Option<&Page> {
        self.meta().page.as_ref()
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn units(&self) -> &str {
        &self.meta().units
    }

    fn important(&self) -> bool {
        self.meta().important
    }

    /// Whether `other` may be merged with this value
    ///
    /// Page equality is not part of this check; same-page merging enforces it.
    fn is_mergable_with(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.kind() == other.kind()
            && self.name() == other.name()
            && self.units() == other.units()
            && self.important() == other.important()
    }

    /// A single number that best represents this value
    fn representative_number(&self) -> f64;

    /// A string that best represents this value
    fn representative_string(&self) -> String;

    /// Buildbot data type, which depends on the reporting context
    fn buildbot_data_type(&self, output_context: OutputContext) -> &'static str;

    fn buildbot_value(&self) -> BuildbotValue;
}

/// Scalar and list classification shared by the numeric kinds
pub(crate) fn numeric_buildbot_data_type(
    meta: &ValueMeta,
    output_context: OutputContext,
) -> &'static str {
    if meta.is_important_given_output_context(output_context) {
        "default"
    } else {
        "unimportant"
    }
}

/// Reject samples that are not numbers
pub(crate) fn check_numeric(name: &str, samples: &[f64]) -> Result<()> {
    if let Some(index) = samples.iter().position(|v| v.is_nan()) {
        return Err(Error::precondition(format!(
            "Value '{}' has a non-numeric sample at index {}",
            name, index
        )));
    }
    Ok(())
}

/// Render a sample the way result output expects
pub fn format_number(v: f64) -> String {
    format!("{}", v)
}

/// A value of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarValue),
    List(ListOfScalarValues),
    Histogram(HistogramValue),
}

impl Value {
    /// Merge like values recorded on the same page into one value
    ///
    /// All values must be the same kind; the first one selects the kind's
    /// same-page merge.
    pub fn merge_like_values_from_same_page(values: &[Value]) -> Result<Value> {
        let first = values.first().ok_or_else(|| {
            Error::precondition("Cannot merge an empty list of values from the same page")
        })?;

        Ok(match first {
            Value::Scalar(_) => {
                let scalars = collect_kind(values, Value::as_scalar)?;
                Value::List(ScalarValue::merge_like_values_from_same_page(&scalars)?)
            }
            Value::List(_) => {
                let lists = collect_kind(values, Value::as_list)?;
                Value::List(ListOfScalarValues::merge_like_values_from_same_page(&lists)?)
            }
            Value::Histogram(_) => {
                let histograms = collect_kind(values, Value::as_histogram)?;
                Value::Histogram(HistogramValue::merge_like_values_from_same_page(&histograms)?)
            }
        })
    }

    /// Merge like values from different pages into one summary value
    ///
    /// Returns `Ok(None)` for kinds that make no sense merged across pages.
    pub fn merge_like_values_from_different_pages(
        values: &[Value],
        group_by_name_suffix: bool,
    ) -> Result<Option<Value>> {
        let first = values.first().ok_or_else(|| {
            Error::precondition("Cannot merge an empty list of values from different pages")
        })?;

        Ok(match first {
            Value::Scalar(_) => {
                let scalars = collect_kind(values, Value::as_scalar)?;
                Some(Value::List(ScalarValue::merge_like_values_from_different_pages(
                    &scalars,
                    group_by_name_suffix,
                )?))
            }
            Value::List(_) => {
                let lists = collect_kind(values, Value::as_list)?;
                Some(Value::List(
                    ListOfScalarValues::merge_like_values_from_different_pages(
                        &lists,
                        group_by_name_suffix,
                    )?,
                ))
            }
            Value::Histogram(_) => {
                let histograms = collect_kind(values, Value::as_histogram)?;
                HistogramValue::merge_like_values_from_different_pages(
                    &histograms,
                    group_by_name_suffix,
                )?
                .map(Value::Histogram)
            }
        })
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListOfScalarValues> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramValue> {
        match self {
            Value::Histogram(v) => Some(v),
            _ => None,
        }
    }
}

fn collect_kind<T: Clone>(values: &[Value], pick: fn(&Value) -> Option<&T>) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            pick(v).cloned().ok_or_else(|| {
                Error::precondition(format!(
                    "Cannot merge value '{}' of kind {} with values of a different kind",
                    v.name(),
                    v.kind().as_str()
                ))
            })
        })
        .collect()
}

impl MeasurementValue for Value {
    fn meta(&self) -> &ValueMeta {
        match self {
            Value::Scalar(v) => v.meta(),
            Value::List(v) => v.meta(),
            Value::Histogram(v) => v.meta(),
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(v) => v.kind(),
            Value::List(v) => v.kind(),
            Value::Histogram(v) => v.kind(),
        }
    }

    fn is_mergable_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.is_mergable_with(b),
            (Value::List(a), Value::List(b)) => a.is_mergable_with(b),
            (Value::Histogram(a), Value::Histogram(b)) => a.is_mergable_with(b),
            _ => false,
        }
    }

    fn representative_number(&self) -> f64 {
        match self {
            Value::Scalar(v) => v.representative_number(),
            Value::List(v) => v.representative_number(),
            Value::Histogram(v) => v.representative_number(),
        }
    }

    fn representative_string(&self) -> String {
        match self {
            Value::Scalar(v) => v.representative_string(),
            Value::List(v) => v.representative_string(),
            Value::Histogram(v) => v.representative_string(),
        }
    }

    fn buildbot_data_type(&self, output_context: OutputContext) -> &'static str {
        match self {
            Value::Scalar(v) => v.buildbot_data_type(output_context),
            Value::List(v) => v.buildbot_data_type(output_context),
            Value::Histogram(v) => v.buildbot_data_type(output_context),
        }
    }

    fn buildbot_value(&self) -> BuildbotValue {
        match self {
            Value::Scalar(v) => v.buildbot_value(),
            Value::List(v) => v.buildbot_value(),
            Value::Histogram(v) => v.buildbot_value(),
        }
    }
}

impl From<ScalarValue> for Value {
    fn from(v: ScalarValue) -> Self {
        Value::Scalar(v)
    }
}

impl From<ListOfScalarValues> for Value {
    fn from(v: ListOfScalarValues) -> Self {
        Value::List(v)
    }
}

impl From<HistogramValue> for Value {
    fn from(v: HistogramValue) -> Self {
        Value::Histogram(v)
    }
}
