//! Value naming conventions
//!
//! Values are named `chart.trace`, where the chart part is optional. Buildbot
//! instead addresses a result by a (measurement, trace) pair, so these helpers
//! convert between the two conventions.

use crate::{Error, Result};

/// Separator between the chart and trace parts of a value name
pub const CHART_TRACE_SEPARATOR: char = '.';

/// Reserved name; page urls occupy this column in tabular output
const RESERVED_NAME: &str = "url";

/// Build a value name from a trace name and an optional chart name
///
/// A bare trace name such as `numPixels` has no chart. Values meant to be
/// displayed together share a chart, giving `screen.numPixels`.
///
/// # Examples
///
/// ```
/// use pageperf_common::value::naming::value_name_from_trace_and_chart_name;
///
/// assert_eq!(value_name_from_trace_and_chart_name("numPixels", None).unwrap(), "numPixels");
/// assert_eq!(
///     value_name_from_trace_and_chart_name("numPixels", Some("screen")).unwrap(),
///     "screen.numPixels"
/// );
/// ```
pub fn value_name_from_trace_and_chart_name(
    trace_name: &str,
    chart_name: Option<&str>,
) -> Result<String> {
    if trace_name == RESERVED_NAME {
        return Err(Error::precondition(format!(
            "The name {} cannot be used",
            RESERVED_NAME
        )));
    }

    match chart_name {
        Some(chart) if !chart.is_empty() => {
            Ok(format!("{}{}{}", chart, CHART_TRACE_SEPARATOR, trace_name))
        }
        _ => Ok(trace_name.to_string()),
    }
}

/// The part of a name after its first `.`, or the whole name
pub fn name_suffix(name: &str) -> &str {
    match name.split_once(CHART_TRACE_SEPARATOR) {
        Some((_, suffix)) => suffix,
        None => name,
    }
}

/// Convert a value name into buildbot's (measurement, trace) pair
///
/// `chart.trace` splits at the first `.`; a bare name is used for both parts.
pub fn buildbot_chart_and_trace_name(name: &str) -> (&str, &str) {
    name.split_once(CHART_TRACE_SEPARATOR).unwrap_or((name, name))
}
