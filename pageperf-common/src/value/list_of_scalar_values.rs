//! Lists of numeric samples

use super::{
    check_numeric, format_number, numeric_buildbot_data_type, BuildbotValue, MeasurementValue,
    MergePolicy, OutputContext, ValueKind, ValueMeta,
};
use crate::page::Page;
use crate::{Error, Result};
use tracing::debug;

/// An ordered, non-empty list of samples for one measurement
#[derive(Debug, Clone, PartialEq)]
pub struct ListOfScalarValues {
    meta: ValueMeta,
    values: Vec<f64>,
    same_page_merge_policy: MergePolicy,
}

impl ListOfScalarValues {
    /// Create a list value
    ///
    /// Fails with [`Error::Precondition`] when `values` is empty or holds a
    /// NaN.
    pub fn new(
        page: Option<Page>,
        name: impl Into<String>,
        units: impl Into<String>,
        values: Vec<f64>,
        important: bool,
        same_page_merge_policy: MergePolicy,
    ) -> Result<Self> {
        let meta = ValueMeta::new(page, name, units, important);
        if values.is_empty() {
            return Err(Error::precondition(format!(
                "Value '{}' must have at least one sample",
                meta.name
            )));
        }
        check_numeric(&meta.name, &values)?;
        Ok(Self {
            meta,
            values,
            same_page_merge_policy,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn same_page_merge_policy(&self) -> MergePolicy {
        self.same_page_merge_policy
    }

    /// Combine the values one page produced across repeated runs
    ///
    /// Every input must share page, name, units, importance and policy.
    /// [`MergePolicy::PickFirst`] keeps the first input's samples;
    /// [`MergePolicy::Concatenate`] joins all samples in input order.
    pub fn merge_like_values_from_same_page(values: &[ListOfScalarValues]) -> Result<Self> {
        let v0 = first_checked(values, true, false)?;

        let merged = match v0.same_page_merge_policy {
            MergePolicy::PickFirst => v0.values.clone(),
            MergePolicy::Concatenate => concatenated(values),
        };
        debug!(
            name = %v0.meta.name,
            policy = %v0.same_page_merge_policy,
            inputs = values.len(),
            samples = merged.len(),
            "Merged list values from same page"
        );

        Ok(Self {
            meta: v0.meta.clone(),
            values: merged,
            same_page_merge_policy: v0.same_page_merge_policy,
        })
    }

    /// Combine values from different pages into one page-less summary
    ///
    /// Samples are always concatenated in input order. The result takes the
    /// first input's name, or its name suffix when `group_by_name_suffix`
    /// is set, so `x.z` and `y.z` merge into `z`.
    pub fn merge_like_values_from_different_pages(
        values: &[ListOfScalarValues],
        group_by_name_suffix: bool,
    ) -> Result<Self> {
        let v0 = first_checked(values, false, group_by_name_suffix)?;
        let merged = concatenated(values);
        debug!(
            name = %v0.meta.name,
            inputs = values.len(),
            samples = merged.len(),
            "Merged list values from different pages"
        );

        Ok(Self {
            meta: ValueMeta::new(
                None,
                v0.meta.merged_name(group_by_name_suffix),
                v0.meta.units.clone(),
                v0.meta.important,
            ),
            values: merged,
            same_page_merge_policy: v0.same_page_merge_policy,
        })
    }
}

fn concatenated(values: &[ListOfScalarValues]) -> Vec<f64> {
    values.iter().flat_map(|v| v.values.iter().copied()).collect()
}

fn first_checked(
    values: &[ListOfScalarValues],
    same_page: bool,
    group_by_name_suffix: bool,
) -> Result<&ListOfScalarValues> {
    let (v0, rest) = values
        .split_first()
        .ok_or_else(|| Error::precondition("Cannot merge an empty list of list values"))?;
    for v in rest {
        v0.meta.check_alike(&v.meta, same_page, group_by_name_suffix)?;
        if v.same_page_merge_policy != v0.same_page_merge_policy {
            return Err(Error::precondition(format!(
                "Cannot merge value '{}': merge policy {} differs from {}",
                v.meta.name, v.same_page_merge_policy, v0.same_page_merge_policy
            )));
        }
    }
    Ok(v0)
}

impl MeasurementValue for ListOfScalarValues {
    fn meta(&self) -> &ValueMeta {
        &self.meta
    }

    fn kind(&self) -> ValueKind {
        ValueKind::ListOfScalarValues
    }

    fn is_mergable_with(&self, other: &Self) -> bool {
        self.meta.name == other.meta.name
            && self.meta.units == other.meta.units
            && self.meta.important == other.meta.important
            && self.same_page_merge_policy == other.same_page_merge_policy
    }

    /// Arithmetic mean of the samples
    fn representative_number(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn representative_string(&self) -> String {
        let joined: Vec<String> = self.values.iter().map(|v| format_number(*v)).collect();
        format!("[{}]", joined.join(", "))
    }

    fn buildbot_data_type(&self, output_context: OutputContext) -> &'static str {
        numeric_buildbot_data_type(&self.meta, output_context)
    }

    fn buildbot_value(&self) -> BuildbotValue {
        BuildbotValue::Samples(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page0() -> Page {
        Page::new("http://www.bar.com/")
    }

    fn list(page: Option<Page>, values: Vec<f64>, policy: MergePolicy) -> ListOfScalarValues {
        ListOfScalarValues::new(page, "x", "unit", values, true, policy).unwrap()
    }

    #[test]
    fn test_same_page_merging_with_concatenate_policy() {
        let v0 = list(Some(page0()), vec![1.0, 2.0], MergePolicy::Concatenate);
        let v1 = list(Some(page0()), vec![3.0, 4.0], MergePolicy::Concatenate);
        assert!(v1.is_mergable_with(&v0));

        let merged = ListOfScalarValues::merge_like_values_from_same_page(&[v0, v1]).unwrap();
        assert_eq!(merged.page(), Some(&page0()));
        assert_eq!(merged.name(), "x");
        assert_eq!(merged.units(), "unit");
        assert_eq!(merged.same_page_merge_policy(), MergePolicy::Concatenate);
        assert!(merged.important());
        assert_eq!(merged.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_same_page_merging_with_pick_first_policy() {
        let v0 = list(Some(page0()), vec![1.0, 2.0], MergePolicy::PickFirst);
        let v1 = list(Some(page0()), vec![3.0, 4.0], MergePolicy::PickFirst);
        assert!(v1.is_mergable_with(&v0));

        let merged = ListOfScalarValues::merge_like_values_from_same_page(&[v0, v1]).unwrap();
        assert_eq!(merged.page(), Some(&page0()));
        assert_eq!(merged.same_page_merge_policy(), MergePolicy::PickFirst);
        assert!(merged.important());
        assert_eq!(merged.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_different_page_merging() {
        let v0 = list(Some(page0()), vec![1.0, 2.0], MergePolicy::PickFirst);
        let v1 = list(
            Some(Page::new("http://www.baz.com/")),
            vec![3.0, 4.0],
            MergePolicy::PickFirst,
        );
        assert!(v1.is_mergable_with(&v0));

        let merged =
            ListOfScalarValues::merge_like_values_from_different_pages(&[v0, v1], false).unwrap();
        assert_eq!(merged.page(), None);
        assert_eq!(merged.name(), "x");
        assert_eq!(merged.units(), "unit");
        assert_eq!(merged.same_page_merge_policy(), MergePolicy::PickFirst);
        assert!(merged.important());
        assert_eq!(merged.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_values_rejected() {
        let err = ListOfScalarValues::new(None, "x", "unit", vec![], true, MergePolicy::Concatenate)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_nan_sample_rejected() {
        let err = ListOfScalarValues::new(
            None,
            "x",
            "unit",
            vec![1.0, f64::NAN],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_policy_mismatch_rejected() {
        let v0 = list(Some(page0()), vec![1.0], MergePolicy::Concatenate);
        let v1 = list(Some(page0()), vec![2.0], MergePolicy::PickFirst);
        assert!(!v0.is_mergable_with(&v1));
        let pair = [v0, v1];
        assert!(ListOfScalarValues::merge_like_values_from_same_page(&pair).is_err());
        assert!(ListOfScalarValues::merge_like_values_from_different_pages(&pair, false).is_err());
    }

    #[test]
    fn test_importance_mismatch_rejected() {
        let important = list(Some(page0()), vec![1.0], MergePolicy::Concatenate);
        let unimportant = ListOfScalarValues::new(
            Some(page0()),
            "x",
            "unit",
            vec![2.0],
            false,
            MergePolicy::Concatenate,
        )
        .unwrap();
        assert!(!important.is_mergable_with(&unimportant));

        let err = ListOfScalarValues::merge_like_values_from_same_page(&[
            important.clone(),
            unimportant.clone(),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(err.to_string().contains("importance"));

        let other_page = ListOfScalarValues::new(
            Some(Page::new("http://www.baz.com/")),
            "x",
            "unit",
            vec![2.0],
            false,
            MergePolicy::Concatenate,
        )
        .unwrap();
        let pair = [important, other_page];
        let err = ListOfScalarValues::merge_like_values_from_different_pages(&pair, false)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(err.to_string().contains("importance"));
    }

    #[test]
    fn test_suffix_group_units_mismatch_rejected() {
        let v0 = ListOfScalarValues::new(
            Some(page0()),
            "cold.load",
            "ms",
            vec![1.0],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap();
        let v1 = ListOfScalarValues::new(
            Some(Page::new("http://www.baz.com/")),
            "warm.load",
            "seconds",
            vec![2.0],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap();

        let err = ListOfScalarValues::merge_like_values_from_different_pages(&[v0, v1], true)
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(err.to_string().contains("units"));
    }

    #[test]
    fn test_suffix_group_merges_matching_units() {
        let v0 = ListOfScalarValues::new(
            Some(page0()),
            "cold.load",
            "ms",
            vec![1.0],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap();
        let v1 = ListOfScalarValues::new(
            Some(Page::new("http://www.baz.com/")),
            "warm.load",
            "ms",
            vec![2.0],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap();

        let pair = [v0, v1];
        let merged =
            ListOfScalarValues::merge_like_values_from_different_pages(&pair, true).unwrap();
        assert_eq!(merged.name(), "load");
        assert_eq!(merged.values(), &[1.0, 2.0]);

        // Without suffix grouping the names themselves must agree
        assert!(ListOfScalarValues::merge_like_values_from_different_pages(&pair, false).is_err());
    }

    #[test]
    fn test_units_mismatch_rejected() {
        let v0 = list(Some(page0()), vec![1.0], MergePolicy::Concatenate);
        let v1 = ListOfScalarValues::new(
            Some(page0()),
            "x",
            "ms",
            vec![2.0],
            true,
            MergePolicy::Concatenate,
        )
        .unwrap();
        assert!(!v0.is_mergable_with(&v1));
        assert!(ListOfScalarValues::merge_like_values_from_same_page(&[v0, v1]).is_err());
    }

    #[test]
    fn test_importance_does_not_change_samples() {
        let v0 = ListOfScalarValues::new(
            None,
            "x",
            "unit",
            vec![1.0],
            false,
            MergePolicy::Concatenate,
        )
        .unwrap();
        let merged =
            ListOfScalarValues::merge_like_values_from_same_page(&[v0.clone(), v0]).unwrap();
        assert!(!merged.important());
        assert_eq!(merged.values(), &[1.0, 1.0]);
    }

    #[test]
    fn test_representative_number_is_mean() {
        let v = list(None, vec![1.0, 2.0, 3.0, 4.0], MergePolicy::Concatenate);
        assert_eq!(v.representative_number(), 2.5);
        assert_eq!(v.representative_string(), "[1, 2, 3, 4]");
    }

    #[test]
    fn test_buildbot_data_type() {
        let v = list(None, vec![1.0], MergePolicy::Concatenate);
        assert_eq!(v.buildbot_data_type(OutputContext::PerPageResult), "unimportant");
        assert_eq!(v.buildbot_data_type(OutputContext::MergedPagesResult), "default");
    }
}
