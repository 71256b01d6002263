//! Grouping and merging of arbitrary value collections
//!
//! The per-kind merges in [`crate::value`] expect a group of like values.
//! These helpers take every value a run produced, partition it into such
//! groups and merge each one.

use crate::value::{MeasurementValue, Value};
use crate::{Error, Result};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Group items by key, keeping keys in first-seen order
///
/// Items within a group keep their input order.
pub fn group_stably<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut index_by_key: HashMap<K, usize> = HashMap::new();
    for item in items {
        let k = key(&item);
        match index_by_key.get(&k) {
            Some(&idx) => groups[idx].push(item),
            None => {
                index_by_key.insert(k, groups.len());
                groups.push(vec![item]);
            }
        }
    }
    groups
}

/// Merge values that share a page and a name
///
/// Produces one value per (page, name), in first-seen order.
pub fn merge_like_values_from_same_page(values: &[Value]) -> Result<Vec<Value>> {
    let groups = group_stably(values, |v| {
        (v.page().map(|p| p.url.clone()), v.name().to_string())
    });
    debug!(inputs = values.len(), groups = groups.len(), "Merging values from same page");

    groups
        .into_iter()
        .map(|group| {
            let group = check_group(group)?;
            Value::merge_like_values_from_same_page(&group)
        })
        .collect()
}

/// Merge values that share a name across every page
///
/// With `group_by_name_suffix`, `x.z` and `y.z` form one group named `z`.
/// Groups whose kind cannot be merged across pages are left out.
pub fn merge_like_values_from_different_pages(
    values: &[Value],
    group_by_name_suffix: bool,
) -> Result<Vec<Value>> {
    let groups = group_stably(values, |v| {
        if group_by_name_suffix {
            v.meta().name_suffix().to_string()
        } else {
            v.name().to_string()
        }
    });
    debug!(
        inputs = values.len(),
        groups = groups.len(),
        group_by_name_suffix,
        "Merging values from different pages"
    );

    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        let group = check_group(group)?;
        match Value::merge_like_values_from_different_pages(&group, group_by_name_suffix)? {
            Some(value) => merged.push(value),
            None => debug!(
                name = %group[0].name(),
                "Value kind not mergeable across pages, skipped"
            ),
        }
    }
    Ok(merged)
}

fn check_group(group: Vec<&Value>) -> Result<Vec<Value>> {
    let first = group[0];
    if let Some(other) = group.iter().find(|v| v.kind() != first.kind()) {
        return Err(Error::precondition(format!(
            "Value '{}' was recorded both as {} and as {}",
            other.name(),
            first.kind().as_str(),
            other.kind().as_str()
        )));
    }
    Ok(group.into_iter().cloned().collect())
}
