// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Object selection shared by all backends

use crate::StoredObject;
use std::collections::{BTreeMap, BTreeSet};
use taxii_api_contract::{ObjectFilter, VersionMatch, Window};

/// Select the object versions matched by `filter`
///
/// Attribute filters (`match[id]`, `match[type]`, `match[spec_version]` and
/// `added_after`) run first; version selection then runs per object id and
/// the union of all requested version matches is kept. The result is ordered
/// by `date_added`, then id, then version.
pub fn select<'a>(objects: &'a [StoredObject], filter: &ObjectFilter) -> Vec<&'a StoredObject> {
    let mut by_id: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, object) in objects.iter().enumerate() {
        if matches_attributes(object, filter) {
            by_id.entry(object.id.as_str()).or_default().push(index);
        }
    }

    let mut chosen = BTreeSet::new();
    for indices in by_id.values_mut() {
        indices.sort_by(|a, b| objects[*a].version.cmp(&objects[*b].version));
        for version in &filter.versions {
            match version {
                VersionMatch::Last => chosen.extend(indices.last().copied()),
                VersionMatch::First => chosen.extend(indices.first().copied()),
                VersionMatch::All => chosen.extend(indices.iter().copied()),
                VersionMatch::At(at) => chosen.extend(
                    indices
                        .iter()
                        .copied()
                        .filter(|index| &objects[*index].version == at),
                ),
            }
        }
    }

    let mut selected: Vec<&StoredObject> = chosen.into_iter().map(|index| &objects[index]).collect();
    selected.sort_by(|a, b| {
        (a.date_added.as_str(), a.id.as_str(), a.version.as_str())
            .cmp(&(b.date_added.as_str(), b.id.as_str(), b.version.as_str()))
    });
    selected
}

fn matches_attributes(object: &StoredObject, filter: &ObjectFilter) -> bool {
    let listed = |values: &[String], value: &str| values.is_empty() || values.iter().any(|v| v == value);

    listed(&filter.ids, &object.id)
        && listed(&filter.types, &object.object_type)
        && listed(&filter.spec_versions, &object.spec_version)
        && filter
            .added_after
            .as_deref()
            .map_or(true, |after| object.date_added.as_str() > after)
}

/// Cut one page out of `items`, returning it together with the unpaginated count
pub fn paginate<T>(items: Vec<T>, window: Window) -> (Vec<T>, usize) {
    let total = items.len();
    let page = items
        .into_iter()
        .skip(window.offset)
        .take(window.limit.unwrap_or(usize::MAX))
        .collect();
    (page, total)
}
