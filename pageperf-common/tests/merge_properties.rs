//! Property-based tests for value merging
//!
//! Checks the merge rules over arbitrary sample lists:
//! - Same-page concatenate joins samples in order
//! - Same-page pick-first keeps only the first value's samples
//! - Cross-page merges never keep a page
//! - Cross-page naming follows the first value (or its suffix)

use pageperf_common::value::naming::name_suffix;
use pageperf_common::{ListOfScalarValues, MeasurementValue, MergePolicy, Page};
use proptest::prelude::*;

fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..16)
}

fn list(
    page: Option<Page>,
    name: &str,
    values: Vec<f64>,
    policy: MergePolicy,
) -> ListOfScalarValues {
    ListOfScalarValues::new(page, name, "unit", values, true, policy).unwrap()
}

proptest! {
    #[test]
    fn proptest_same_page_concatenate_preserves_order(a in samples(), b in samples()) {
        let page = Page::new("http://www.bar.com/");
        let v0 = list(Some(page.clone()), "x", a.clone(), MergePolicy::Concatenate);
        let v1 = list(Some(page.clone()), "x", b.clone(), MergePolicy::Concatenate);

        let merged = ListOfScalarValues::merge_like_values_from_same_page(&[v0, v1]).unwrap();
        let expected: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
        prop_assert_eq!(merged.values(), expected.as_slice());
        prop_assert_eq!(merged.page(), Some(&page));
    }

    #[test]
    fn proptest_same_page_pick_first_keeps_first(a in samples(), b in samples()) {
        let page = Page::new("http://www.bar.com/");
        let v0 = list(Some(page.clone()), "x", a.clone(), MergePolicy::PickFirst);
        let v1 = list(Some(page), "x", b, MergePolicy::PickFirst);

        let merged = ListOfScalarValues::merge_like_values_from_same_page(&[v0, v1]).unwrap();
        prop_assert_eq!(merged.values(), a.as_slice());
    }

    #[test]
    fn proptest_cross_page_clears_page(
        groups in prop::collection::vec(samples(), 1..6),
        policy in prop_oneof![Just(MergePolicy::Concatenate), Just(MergePolicy::PickFirst)],
    ) {
        let values: Vec<ListOfScalarValues> = groups
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let page = Page::new(format!("http://www.page{}.com/", i));
                list(Some(page), "x", s.clone(), policy)
            })
            .collect();

        let merged =
            ListOfScalarValues::merge_like_values_from_different_pages(&values, false).unwrap();
        prop_assert!(merged.page().is_none());
        prop_assert_eq!(merged.same_page_merge_policy(), policy);

        let expected: Vec<f64> = groups.into_iter().flatten().collect();
        prop_assert_eq!(merged.values(), expected.as_slice());
    }

    #[test]
    fn proptest_cross_page_naming(
        chart in "[a-z]{1,8}",
        trace in "[a-z]{1,8}",
        group_by_name_suffix in any::<bool>(),
    ) {
        let name = format!("{}.{}", chart, trace);
        let v0 = list(Some(Page::new("a")), &name, vec![1.0], MergePolicy::Concatenate);
        let v1 = list(Some(Page::new("b")), &name, vec![2.0], MergePolicy::Concatenate);

        let merged = ListOfScalarValues::merge_like_values_from_different_pages(
            &[v0, v1],
            group_by_name_suffix,
        )
        .unwrap();
        if group_by_name_suffix {
            prop_assert_eq!(merged.name(), name_suffix(&name));
            prop_assert_eq!(merged.name(), trace.as_str());
        } else {
            prop_assert_eq!(merged.name(), name.as_str());
        }
    }

    #[test]
    fn proptest_representative_number_is_mean(s in samples()) {
        let v = list(None, "x", s.clone(), MergePolicy::Concatenate);
        let mean = s.iter().sum::<f64>() / s.len() as f64;
        prop_assert!((v.representative_number() - mean).abs() <= 1e-6 * mean.abs().max(1.0));
    }
}
