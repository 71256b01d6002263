//! CSV output, one row per page
//!
//! The header is `page_name` followed by `<name> (<units>)` for every value
//! name, sorted. Cells hold the value's representative number, or `-` when
//! the page has no such value.

use super::ResultsFormatter;
use crate::merge_values::{self, group_stably};
use crate::page::Page;
use crate::results::PageMeasurementResults;
use crate::value::{format_number, MeasurementValue, Value};
use crate::{Error, Result};
use ::csv::{Terminator, WriterBuilder};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use tracing::debug;

/// Writes one CSV row per page
///
/// With `output_after_every_page` each page's row is written as soon as the
/// page finishes, so every page must report the same value names as the
/// first one. Otherwise rows are written at the end from same-page merged
/// values.
pub struct CsvFormatter<W: Write> {
    writer: ::csv::Writer<W>,
    output_after_every_page: bool,
    header_names: Option<Vec<String>>,
}

impl<W: Write> CsvFormatter<W> {
    pub fn new(writer: W, output_after_every_page: bool) -> Self {
        Self {
            writer: WriterBuilder::new()
                .terminator(Terminator::Any(b'\n'))
                .from_writer(writer),
            output_after_every_page,
            header_names: None,
        }
    }

    fn output_header(&mut self, results: &PageMeasurementResults) -> Result<()> {
        if self.header_names.is_some() {
            return Err(Error::precondition("CSV header was already written"));
        }

        let mut names: Vec<String> = results.all_value_names_that_have_been_seen().to_vec();
        names.sort();

        let mut row = vec!["page_name".to_string()];
        for name in &names {
            let units = results.units_for_value_name(name).unwrap_or_default();
            row.push(format!("{} ({})", name, units));
        }
        self.writer.write_record(&row)?;
        self.writer.flush()?;

        debug!(columns = names.len(), "Wrote CSV header");
        self.header_names = Some(names);
        Ok(())
    }

    fn validate_output_names_for_current_page(&self, values: &[Value]) -> Result<()> {
        let header: BTreeSet<&str> = self
            .header_names
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let current: BTreeSet<&str> = values.iter().map(|v| v.name()).collect();
        if header == current {
            return Ok(());
        }
        Err(Error::precondition(format!(
            "Every page must report the same value names when writing CSV after every page. \
             The first page reported {:?}, the current page reported {:?}",
            header, current
        )))
    }

    fn output_values_for_page(&mut self, page: &Page, values: &[&Value]) -> Result<()> {
        let by_name: HashMap<&str, &Value> = values.iter().map(|v| (v.name(), *v)).collect();

        let mut row = vec![page.display_name.clone()];
        for name in self.header_names.iter().flatten() {
            let cell = match by_name.get(name.as_str()) {
                Some(value) if value.representative_number() != 0.0 => {
                    format_number(value.representative_number())
                }
                _ => "-".to_string(),
            };
            row.push(cell);
        }
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ResultsFormatter for CsvFormatter<W> {
    fn did_measure_page(&mut self, results: &PageMeasurementResults) -> Result<()> {
        let values = results.page_specific_values_for_current_page()?;
        if values.is_empty() || !self.output_after_every_page {
            return Ok(());
        }

        if self.header_names.is_none() {
            self.output_header(results)?;
        } else {
            self.validate_output_names_for_current_page(values)?;
        }

        let page = results
            .current_page()
            .ok_or_else(|| Error::precondition("No page is being measured"))?;
        let refs: Vec<&Value> = values.iter().collect();
        self.output_values_for_page(page, &refs)
    }

    fn print_summary(&mut self, results: &PageMeasurementResults) -> Result<()> {
        if self.output_after_every_page {
            self.writer.flush()?;
            return Ok(());
        }

        self.output_header(results)?;

        let merged =
            merge_values::merge_like_values_from_same_page(results.all_page_specific_values())?;
        let groups = group_stably(merged.iter(), |v| v.page().map(|p| p.url.clone()));
        for values_for_page in groups {
            if let Some(page) = values_for_page[0].page() {
                self.output_values_for_page(page, &values_for_page)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
