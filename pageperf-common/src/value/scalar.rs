//! Single-number values

use super::{
    check_numeric, format_number, numeric_buildbot_data_type, BuildbotValue,
    ListOfScalarValues, MeasurementValue, MergePolicy, OutputContext, ValueKind, ValueMeta,
};
use crate::page::Page;
use crate::{Error, Result};
use tracing::debug;

/// One number measured once
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue {
    meta: ValueMeta,
    value: f64,
}

impl ScalarValue {
    pub fn new(
        page: Option<Page>,
        name: impl Into<String>,
        units: impl Into<String>,
        value: f64,
        important: bool,
    ) -> Result<Self> {
        let meta = ValueMeta::new(page, name, units, important);
        check_numeric(&meta.name, &[value])?;
        Ok(Self { meta, value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Repeated scalars on one page become a list of every run's number
    pub fn merge_like_values_from_same_page(values: &[ScalarValue]) -> Result<ListOfScalarValues> {
        let v0 = first_checked(values, true, false)?;
        debug!(name = %v0.meta.name, count = values.len(), "Merging scalars from same page");
        ListOfScalarValues::new(
            v0.meta.page.clone(),
            v0.meta.name.clone(),
            v0.meta.units.clone(),
            values.iter().map(|v| v.value).collect(),
            v0.meta.important,
            MergePolicy::Concatenate,
        )
    }

    /// Scalars from several pages become a page-less list of every number
    pub fn merge_like_values_from_different_pages(
        values: &[ScalarValue],
        group_by_name_suffix: bool,
    ) -> Result<ListOfScalarValues> {
        let v0 = first_checked(values, false, group_by_name_suffix)?;
        debug!(name = %v0.meta.name, count = values.len(), "Merging scalars from different pages");
        ListOfScalarValues::new(
            None,
            v0.meta.merged_name(group_by_name_suffix),
            v0.meta.units.clone(),
            values.iter().map(|v| v.value).collect(),
            v0.meta.important,
            MergePolicy::Concatenate,
        )
    }
}

fn first_checked(
    values: &[ScalarValue],
    same_page: bool,
    group_by_name_suffix: bool,
) -> Result<&ScalarValue> {
    let (v0, rest) = values
        .split_first()
        .ok_or_else(|| Error::precondition("Cannot merge an empty list of scalar values"))?;
    for v in rest {
        v0.meta.check_alike(&v.meta, same_page, group_by_name_suffix)?;
    }
    Ok(v0)
}

impl MeasurementValue for ScalarValue {
    fn meta(&self) -> &ValueMeta {
        &self.meta
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Scalar
    }

    fn representative_number(&self) -> f64 {
        self.value
    }

    fn representative_string(&self) -> String {
        format_number(self.value)
    }

    fn buildbot_data_type(&self, output_context: OutputContext) -> &'static str {
        numeric_buildbot_data_type(&self.meta, output_context)
    }

    fn buildbot_value(&self) -> BuildbotValue {
        BuildbotValue::Samples(vec![self.value])
    }
}
