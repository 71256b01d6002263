//! Perf dashboard line format
//!
//! One result renders as
//!
//! ```text
//! *RESULT measurement: trace= [1,2,3] units
//! Avg measurement: 2.000000units
//! Sd  measurement: 1.000000units
//! ```
//!
//! where the prefix encodes the result type.

use crate::value::{format_number, geom_mean_and_std_dev_from_json, BuildbotValue};
use crate::{Error, Result};

/// Prefix for each result type
fn result_type_prefix(result_type: &str) -> Option<&'static str> {
    match result_type {
        "unimportant" => Some("RESULT "),
        "default" => Some("*RESULT "),
        "informational" => Some(""),
        "unimportant-histogram" => Some("HISTOGRAM "),
        "histogram" => Some("*HISTOGRAM "),
        _ => None,
    }
}

/// Replace characters the dashboard treats as separators
pub fn escape_perf_result(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ':' | '|' | '=' | '/' | '#' | '&' | ',' => '_',
            c => c,
        })
        .collect()
}

/// `Pages: [a,b,c]`
pub fn format_pages<S: AsRef<str>>(page_names: &[S]) -> String {
    let escaped: Vec<String> = page_names
        .iter()
        .map(|p| escape_perf_result(p.as_ref()))
        .collect();
    format!("Pages: [{}]", escaped.join(","))
}

/// Mean and sample standard deviation, only defined for two or more samples
fn mean_and_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let avg = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0);
    Some((avg, variance.sqrt()))
}

/// Render one result, possibly over several lines
pub fn format_perf_result(
    measurement: &str,
    trace: &str,
    value: &BuildbotValue,
    units: &str,
    result_type: &str,
) -> Result<String> {
    let prefix = result_type_prefix(result_type)
        .ok_or_else(|| Error::precondition(format!("Unknown result type '{}'", result_type)))?;
    let trace_name = escape_perf_result(trace);
    let is_histogram_type = matches!(result_type, "histogram" | "unimportant-histogram");

    let (mut output, avg, sd) = match (value, is_histogram_type) {
        (BuildbotValue::Samples(samples), false) => {
            if samples.is_empty() {
                return Err(Error::precondition(format!(
                    "Result '{}' has no samples",
                    measurement
                )));
            }
            if measurement.contains('/') {
                return Err(Error::precondition(format!(
                    "Measurement '{}' must not contain '/'",
                    measurement
                )));
            }
            let rendered = if samples.len() > 1 {
                let joined: Vec<String> = samples.iter().map(|v| format_number(*v)).collect();
                format!("[{}]", joined.join(","))
            } else {
                format_number(samples[0])
            };
            let (avg, sd) = mean_and_std_dev(samples).unwrap_or((0.0, 0.0));
            let line = format!(
                "{}{}: {}{}{} {}",
                prefix,
                escape_perf_result(measurement),
                trace_name,
                if trace_name.is_empty() { "" } else { "= " },
                rendered,
                units
            );
            (line, avg, sd)
        }
        (BuildbotValue::Histogram(json), true) => {
            let (avg, sd) = geom_mean_and_std_dev_from_json(json);
            let line = format!(
                "{}{}: {}= {}",
                prefix,
                escape_perf_result(measurement),
                trace_name,
                json
            );
            (line, avg, sd)
        }
        _ => {
            return Err(Error::precondition(format!(
                "Result type '{}' does not match the value of '{}'",
                result_type, measurement
            )))
        }
    };

    if avg != 0.0 {
        output.push_str(&format!("\nAvg {}: {:.6}{}", measurement, avg, units));
    }
    if sd != 0.0 {
        output.push_str(&format!("\nSd  {}: {:.6}{}", measurement, sd, units));
    }
    Ok(output)
}
