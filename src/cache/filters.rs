//! Persisted free-text search filter state.
//!
//! Each chat search turn extracts a partial filter set; the previous turn's
//! state is loaded, merged (new non-empty fields win) and written back with
//! a fresh TTL. A "reset" turn clears the state explicitly; otherwise it
//! expires on its own.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::key::CacheKeyPolicy;
use super::store::KeyValueStore;
use super::ttl;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilterState {
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub name: Option<String>,
    pub status: Option<i32>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub num_bed: Option<i32>,
    pub num_tolet: Option<i32>,
    pub benefit_ids: Vec<i32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl SearchFilterState {
    /// Merge a freshly extracted filter set onto the stored one.
    ///
    /// Non-empty new fields overwrite old values, empty fields fall back to
    /// the stored state, benefit ids are unioned, and a new price bound that
    /// contradicts the surviving opposite bound drops that opposite bound.
    pub fn merge(old: &SearchFilterState, new: SearchFilterState) -> SearchFilterState {
        let mut merged = SearchFilterState {
            kind: new.kind.or(old.kind),
            province: or_string(new.province, &old.province),
            district: or_string(new.district, &old.district),
            name: or_string(new.name, &old.name),
            status: new.status.or(old.status),
            num_bed: new.num_bed.or(old.num_bed),
            num_tolet: new.num_tolet.or(old.num_tolet),
            from_date: new.from_date.or(old.from_date),
            to_date: new.to_date.or(old.to_date),
            page: new.page.or(old.page),
            limit: new.limit.or(old.limit),
            benefit_ids: union_ids(&old.benefit_ids, &new.benefit_ids),
            price_min: None,
            price_max: None,
        };

        // A re-entered bound that contradicts the remembered opposite bound
        // wins by discarding that opposite bound.
        merged.price_max = match (new.price_min, old.price_max) {
            (Some(min), Some(max)) if min > max => None,
            _ => new.price_max.or(old.price_max),
        };
        merged.price_min = match (new.price_max, old.price_min) {
            (Some(max), Some(min)) if max < min => None,
            _ => new.price_min.or(old.price_min),
        };
        merged
    }
}

fn or_string(new: Option<String>, old: &Option<String>) -> Option<String> {
    match new {
        Some(s) if !s.is_empty() => Some(s),
        _ => old.clone(),
    }
}

fn union_ids(a: &[i32], b: &[i32]) -> Vec<i32> {
    let mut result = Vec::new();
    for id in a.iter().chain(b.iter()) {
        if !result.contains(id) {
            result.push(*id);
        }
    }
    result
}

pub async fn save_last_filters(
    store: &dyn KeyValueStore,
    user_id: i64,
    session_id: &str,
    filters: &SearchFilterState,
) -> Result<()> {
    let key = CacheKeyPolicy::last_filters(user_id, session_id);
    let bytes = serde_json::to_vec(filters)?;
    store.set(&key, &bytes, ttl::last_filters_ttl()).await
}

pub async fn get_last_filters(
    store: &dyn KeyValueStore,
    user_id: i64,
    session_id: &str,
) -> SearchFilterState {
    let key = CacheKeyPolicy::last_filters(user_id, session_id);
    match store.get(&key).await {
        Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!("Discarding undecodable filter state {}: {}", key, e);
            SearchFilterState::default()
        }),
        None => SearchFilterState::default(),
    }
}

pub async fn clear_last_filters(
    store: &dyn KeyValueStore,
    user_id: i64,
    session_id: &str,
) -> Result<()> {
    store
        .delete(&CacheKeyPolicy::last_filters(user_id, session_id))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_non_empty_fields_overwrite_old() {
        let old = SearchFilterState {
            province: Some("vung tau".into()),
            kind: Some(0),
            ..Default::default()
        };
        let new = SearchFilterState {
            province: Some("da lat".into()),
            ..Default::default()
        };
        let merged = SearchFilterState::merge(&old, new);
        assert_eq!(merged.province.as_deref(), Some("da lat"));
        assert_eq!(merged.kind, Some(0));
    }

    #[test]
    fn empty_fields_fall_back_to_old() {
        let old = SearchFilterState {
            name: Some("sea view".into()),
            num_bed: Some(2),
            ..Default::default()
        };
        let merged = SearchFilterState::merge(&old, SearchFilterState::default());
        assert_eq!(merged.name.as_deref(), Some("sea view"));
        assert_eq!(merged.num_bed, Some(2));
    }

    #[test]
    fn benefit_ids_are_unioned_without_duplicates() {
        let old = SearchFilterState {
            benefit_ids: vec![1, 2],
            ..Default::default()
        };
        let new = SearchFilterState {
            benefit_ids: vec![2, 3],
            ..Default::default()
        };
        let merged = SearchFilterState::merge(&old, new);
        assert_eq!(merged.benefit_ids, vec![1, 2, 3]);
    }

    #[test]
    fn contradictory_price_bounds_drop_the_stale_side() {
        let old = SearchFilterState {
            price_max: Some(100),
            ..Default::default()
        };
        let new = SearchFilterState {
            price_min: Some(500),
            ..Default::default()
        };
        let merged = SearchFilterState::merge(&old, new);
        assert_eq!(merged.price_min, Some(500));
        assert_eq!(merged.price_max, None);
    }

    #[tokio::test]
    async fn state_round_trips_through_the_store() {
        use crate::cache::store::MemoryStore;
        let store = MemoryStore::new();
        let filters = SearchFilterState {
            province: Some("vung tau".into()),
            benefit_ids: vec![4],
            ..Default::default()
        };

        save_last_filters(&store, 1, "s", &filters).await.unwrap();
        assert_eq!(get_last_filters(&store, 1, "s").await, filters);

        clear_last_filters(&store, 1, "s").await.unwrap();
        assert_eq!(
            get_last_filters(&store, 1, "s").await,
            SearchFilterState::default()
        );
    }
}
