//! Page measurement results
//!
//! Collects the values a page set run produces, one page at a time:
//!
//! ```text
//! will_measure_page(page) -> add(value)* -> did_measure_page()
//! ```
//!
//! Every value is checked against the first value recorded under the same
//! name, so a name keeps one kind, one unit and one importance for the whole
//! run. Formatters in [`crate::output`] read the collected values back.

use crate::page::Page;
use crate::value::{MeasurementValue, Value};
use crate::{Error, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// A page that failed or errored, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct PageProblem {
    pub page: Page,
    pub message: String,
}

/// Values recorded during one run of a page set
#[derive(Debug, Default)]
pub struct PageMeasurementResults {
    current_page: Option<Page>,
    /// Index into `all_page_specific_values` where the current page starts
    current_page_start: usize,

    representative_values: HashMap<String, Value>,
    value_names_in_order: Vec<String>,

    all_summary_values: Vec<Value>,
    all_page_specific_values: Vec<Value>,

    failures: Vec<PageProblem>,
    errors: Vec<PageProblem>,
}

impl PageMeasurementResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page.as_ref()
    }

    /// Start recording values for `page`
    pub fn will_measure_page(&mut self, page: Page) -> Result<()> {
        if let Some(current) = &self.current_page {
            return Err(Error::precondition(format!(
                "Cannot start measuring {} while {} is still being measured",
                page.url, current.url
            )));
        }
        debug!(page = %page.url, "Measuring page");
        self.current_page = Some(page);
        self.current_page_start = self.all_page_specific_values.len();
        Ok(())
    }

    /// Record a value for the page being measured
    ///
    /// The value must carry the current page.
    pub fn add(&mut self, value: Value) -> Result<()> {
        let current = self
            .current_page
            .as_ref()
            .ok_or_else(|| Error::precondition("add() called outside will_measure_page()"))?;
        if value.page() != Some(current) {
            return Err(Error::precondition(format!(
                "Value '{}' does not belong to the page being measured ({})",
                value.name(),
                current.url
            )));
        }
        self.validate_value(&value)?;
        self.all_page_specific_values.push(value);
        Ok(())
    }

    /// Record a value that is not tied to any page
    pub fn add_summary(&mut self, value: Value) -> Result<()> {
        if value.page().is_some() {
            return Err(Error::precondition(format!(
                "Summary value '{}' must not have a page",
                value.name()
            )));
        }
        self.validate_value(&value)?;
        self.all_summary_values.push(value);
        Ok(())
    }

    /// Finish the current page
    pub fn did_measure_page(&mut self) -> Result<()> {
        let page = self
            .current_page
            .take()
            .ok_or_else(|| Error::precondition("Failed to call will_measure_page()"))?;
        debug!(
            page = %page.url,
            values = self.all_page_specific_values.len() - self.current_page_start,
            "Finished measuring page"
        );
        Ok(())
    }

    pub fn add_failure(&mut self, page: Page, message: impl Into<String>) {
        let message = message.into();
        warn!(page = %page.url, %message, "Page failed");
        self.failures.push(PageProblem { page, message });
    }

    pub fn add_error(&mut self, page: Page, message: impl Into<String>) {
        let message = message.into();
        warn!(page = %page.url, %message, "Page errored");
        self.errors.push(PageProblem { page, message });
    }

    pub fn failures(&self) -> &[PageProblem] {
        &self.failures
    }

    pub fn errors(&self) -> &[PageProblem] {
        &self.errors
    }

    pub fn had_errors_or_failures(&self) -> bool {
        !self.failures.is_empty() || !self.errors.is_empty()
    }

    pub fn pages_that_had_errors_or_failures(&self) -> HashSet<&Page> {
        self.failures
            .iter()
            .chain(self.errors.iter())
            .map(|p| &p.page)
            .collect()
    }

    /// Pages that produced values and neither failed nor errored
    pub fn pages_that_succeeded(&self) -> BTreeSet<&Page> {
        let bad = self.pages_that_had_errors_or_failures();
        self.all_page_specific_values
            .iter()
            .filter_map(|v| v.page())
            .filter(|p| !bad.contains(p))
            .collect()
    }

    /// Every value name recorded so far, in first-seen order
    pub fn all_value_names_that_have_been_seen(&self) -> &[String] {
        &self.value_names_in_order
    }

    pub fn units_for_value_name(&self, value_name: &str) -> Option<&str> {
        self.representative_values
            .get(value_name)
            .map(|v| v.units())
    }

    pub fn all_page_specific_values(&self) -> &[Value] {
        &self.all_page_specific_values
    }

    pub fn summary_values(&self) -> &[Value] {
        &self.all_summary_values
    }

    /// Values recorded so far for the page being measured
    pub fn page_specific_values_for_current_page(&self) -> Result<&[Value]> {
        if self.current_page.is_none() {
            return Err(Error::precondition("No page is being measured"));
        }
        Ok(&self.all_page_specific_values[self.current_page_start..])
    }

    pub fn all_page_specific_values_for_successful_pages(&self) -> Vec<Value> {
        let bad = self.pages_that_had_errors_or_failures();
        self.all_page_specific_values
            .iter()
            .filter(|v| v.page().map_or(true, |p| !bad.contains(p)))
            .cloned()
            .collect()
    }

    pub fn find_page_specific_values_for_page(&self, page: &Page, value_name: &str) -> Vec<&Value> {
        self.all_page_specific_values
            .iter()
            .filter(|v| v.page() == Some(page) && v.name() == value_name)
            .collect()
    }

    pub fn find_all_page_specific_values_named(&self, value_name: &str) -> Vec<&Value> {
        self.all_page_specific_values
            .iter()
            .filter(|v| v.name() == value_name)
            .collect()
    }

    fn validate_value(&mut self, value: &Value) -> Result<()> {
        match self.representative_values.get(value.name()) {
            Some(representative) => {
                if !value.is_mergable_with(representative) {
                    return Err(Error::precondition(format!(
                        "Value '{}' ({}, {}) is not mergeable with the first value \
                         recorded under that name ({}, {})",
                        value.name(),
                        value.kind().as_str(),
                        value.units(),
                        representative.kind().as_str(),
                        representative.units()
                    )));
                }
            }
            None => {
                self.value_names_in_order.push(value.name().to_string());
                self.representative_values
                    .insert(value.name().to_string(), value.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{HistogramValue, ScalarValue};

    fn pages() -> Vec<Page> {
        vec![
            Page::new("http://www.bar.com/"),
            Page::new("http://www.baz.com/"),
            Page::new("http://www.foo.com/"),
        ]
    }

    fn scalar(page: Option<&Page>, name: &str, units: &str, v: f64) -> Value {
        ScalarValue::new(page.cloned(), name, units, v, true)
            .unwrap()
            .into()
    }

    #[test]
    fn test_basic() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        results.will_measure_page(p[0].clone()).unwrap();
        results.add(scalar(Some(&p[0]), "a", "seconds", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        results.will_measure_page(p[1].clone()).unwrap();
        results.add(scalar(Some(&p[1]), "a", "seconds", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        let values = results.find_page_specific_values_for_page(&p[0], "a");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].name(), "a");
        assert_eq!(values[0].page(), Some(&p[0]));

        assert_eq!(results.find_all_page_specific_values_named("a").len(), 2);
    }

    #[test]
    fn test_value_names_that_have_been_seen() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        results.will_measure_page(p[0].clone()).unwrap();
        results.add(scalar(Some(&p[0]), "a", "a_units", 3.0)).unwrap();
        results.add(scalar(Some(&p[0]), "b", "b_units", 3.0)).unwrap();
        results.add_summary(scalar(None, "c", "c_units", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        assert_eq!(results.all_value_names_that_have_been_seen(), &["a", "b", "c"]);
        assert_eq!(results.units_for_value_name("a"), Some("a_units"));
        assert_eq!(results.units_for_value_name("b"), Some("b_units"));
        assert_eq!(results.units_for_value_name("c"), Some("c_units"));
        assert_eq!(results.units_for_value_name("d"), None);
    }

    #[test]
    fn test_unit_change() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        results.will_measure_page(p[0].clone()).unwrap();
        results.add(scalar(Some(&p[0]), "a", "seconds", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        results.will_measure_page(p[1].clone()).unwrap();
        let err = results
            .add(scalar(Some(&p[1]), "a", "foobgrobbers", 3.0))
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(results.all_value_names_that_have_been_seen(), &["a"]);
        assert_eq!(results.all_page_specific_values().len(), 1);
    }

    #[test]
    fn test_type_change() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        results.will_measure_page(p[0].clone()).unwrap();
        results.add(scalar(Some(&p[0]), "a", "seconds", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        results.will_measure_page(p[1].clone()).unwrap();
        let histogram = HistogramValue::new(Some(p[1].clone()), "a", "seconds", vec![], true);
        assert!(results.add(histogram.into()).is_err());
    }

    #[test]
    fn test_page_protocol_misuse() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        assert!(results.add(scalar(Some(&p[0]), "a", "s", 1.0)).is_err());
        assert!(results.did_measure_page().is_err());
        assert!(results.page_specific_values_for_current_page().is_err());

        results.will_measure_page(p[0].clone()).unwrap();
        assert!(results.will_measure_page(p[1].clone()).is_err());
        // value for another page
        assert!(results.add(scalar(Some(&p[1]), "a", "s", 1.0)).is_err());
        // summary values have no page
        assert!(results.add_summary(scalar(Some(&p[0]), "a", "s", 1.0)).is_err());
    }

    #[test]
    fn test_current_page_values() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        results.will_measure_page(p[0].clone()).unwrap();
        results.add(scalar(Some(&p[0]), "a", "seconds", 3.0)).unwrap();
        results.did_measure_page().unwrap();

        results.will_measure_page(p[1].clone()).unwrap();
        results.add(scalar(Some(&p[1]), "a", "seconds", 4.0)).unwrap();
        let current = results.page_specific_values_for_current_page().unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].page(), Some(&p[1]));
        results.did_measure_page().unwrap();
        assert!(results.page_specific_values_for_current_page().is_err());
    }

    #[test]
    fn test_successful_pages() {
        let p = pages();
        let mut results = PageMeasurementResults::new();
        for page in &p {
            results.will_measure_page(page.clone()).unwrap();
            results.add(scalar(Some(page), "a", "seconds", 3.0)).unwrap();
            results.did_measure_page().unwrap();
        }
        results.add_failure(p[1].clone(), "message");
        results.add_error(p[2].clone(), "boom");

        assert!(results.had_errors_or_failures());
        let succeeded: Vec<&Page> = results.pages_that_succeeded().into_iter().collect();
        assert_eq!(succeeded, vec![&p[0]]);

        let values = results.all_page_specific_values_for_successful_pages();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].page(), Some(&p[0]));
    }
}
