//! In-memory filtering of cached snapshots.
//!
//! Filters run after the cache (or DB fallback) returns, so a stale snapshot
//! is filtered exactly like a fresh one. String filters are case-insensitive
//! substring containment on URL-decoded values; numeric filters are exact;
//! date windows exclude accommodations with an overlapping occupancy window
//! at day granularity.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::cache::filters::SearchFilterState;
use crate::models::{AccommodationStatusWindow, AccommodationView};

#[derive(Debug, Default, Clone)]
pub struct FilterCriteria {
    pub kind: Option<i32>,
    pub status: Option<i32>,
    pub num: Option<i32>,
    pub num_bed: Option<i32>,
    pub num_tolet: Option<i32>,
    pub people: Option<i32>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub name: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub benefit_ids: Vec<i32>,
    /// Accommodations busy in the requested date window.
    pub excluded_ids: HashSet<i64>,
}

/// URL-decode a raw query value; malformed escapes fall back to the raw text.
pub fn decode_param(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FilterCriteria {
    pub fn from_filter_state(state: &SearchFilterState) -> Self {
        Self {
            kind: state.kind,
            status: state.status,
            num_bed: state.num_bed,
            num_tolet: state.num_tolet,
            price_min: state.price_min,
            price_max: state.price_max,
            name: state.name.clone(),
            province: state.province.clone(),
            district: state.district.clone(),
            benefit_ids: state.benefit_ids.clone(),
            ..Default::default()
        }
    }

    pub fn matches(&self, acc: &AccommodationView) -> bool {
        if self.excluded_ids.contains(&acc.id) {
            return false;
        }
        if self.kind.is_some_and(|v| acc.kind != v) {
            return false;
        }
        if self.status.is_some_and(|v| acc.status != v) {
            return false;
        }
        if self.num.is_some_and(|v| acc.num != v) {
            return false;
        }
        if self.num_bed.is_some_and(|v| acc.num_bed != v) {
            return false;
        }
        if self.num_tolet.is_some_and(|v| acc.num_tolet != v) {
            return false;
        }
        if self.people.is_some_and(|v| acc.people != v) {
            return false;
        }
        if self.price_min.is_some_and(|v| acc.price < v) {
            return false;
        }
        if self.price_max.is_some_and(|v| acc.price > v) {
            return false;
        }
        if let Some(name) = &self.name {
            if !contains_ci(&acc.name, name) {
                return false;
            }
        }
        if let Some(province) = &self.province {
            if !contains_ci(&acc.province, province) {
                return false;
            }
        }
        if let Some(district) = &self.district {
            if !contains_ci(&acc.district, district) {
                return false;
            }
        }
        if !self.benefit_ids.is_empty()
            && !acc
                .benefits
                .iter()
                .any(|b| self.benefit_ids.contains(&b.id))
        {
            return false;
        }
        true
    }

    pub fn apply(&self, items: &[AccommodationView]) -> Vec<AccommodationView> {
        items
            .iter()
            .filter(|acc| self.matches(acc))
            .cloned()
            .collect()
    }
}

/// Ids of accommodations whose occupancy window overlaps the requested stay,
/// using an inclusive overlap test on day-granular dates. With no requested
/// window nothing is excluded.
pub fn busy_accommodations(
    windows: &[AccommodationStatusWindow],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> HashSet<i64> {
    let (Some(from), Some(to)) = (from, to) else {
        return HashSet::new();
    };
    windows
        .iter()
        .filter(|w| !(to < w.from_date || from > w.to_date))
        .map(|w| w.accommodation_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Benefit;
    use chrono::Utc;

    fn acc(id: i64, name: &str, province: &str, status: i32, num_bed: i32) -> AccommodationView {
        let now = Utc::now();
        AccommodationView {
            id,
            kind: 0,
            user_id: 1,
            name: name.into(),
            address: String::new(),
            avatar: String::new(),
            short_description: String::new(),
            status,
            num: 4,
            people: 2,
            price: 500,
            num_bed,
            num_tolet: 1,
            province: province.into(),
            district: String::new(),
            ward: String::new(),
            longitude: 0.0,
            latitude: 0.0,
            benefits: vec![Benefit {
                id: 1,
                name: "Pool".into(),
                status: 0,
                created_at: now,
                updated_at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn string_filters_are_case_insensitive_substrings() {
        let items = vec![acc(1, "Sea View Hotel", "Vũng Tàu", 0, 2), acc(2, "Mountain Inn", "Đà Lạt", 0, 2)];
        let criteria = FilterCriteria {
            name: Some("sea view".into()),
            ..Default::default()
        };
        let out = criteria.apply(&items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn url_encoded_params_are_decoded() {
        assert_eq!(decode_param("V%C5%A9ng%20T%C3%A0u"), "Vũng Tàu");
        assert_eq!(decode_param("plain"), "plain");
    }

    #[test]
    fn filtering_is_idempotent() {
        let items = vec![acc(1, "A", "Vũng Tàu", 0, 2), acc(2, "B", "Hà Nội", 1, 3)];
        let criteria = FilterCriteria {
            status: Some(0),
            num_bed: Some(2),
            ..Default::default()
        };
        let once = criteria.apply(&items);
        let twice = criteria.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn busy_windows_exclude_overlapping_stays() {
        let windows = vec![
            AccommodationStatusWindow {
                accommodation_id: 1,
                from_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
                to_date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            },
            AccommodationStatusWindow {
                accommodation_id: 2,
                from_date: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
                to_date: NaiveDate::from_ymd_opt(2025, 6, 22).unwrap(),
            },
        ];
        let from = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let busy = busy_accommodations(&windows, Some(from), Some(to));
        assert!(busy.contains(&1)); // inclusive boundary overlap
        assert!(!busy.contains(&2));
        assert!(busy_accommodations(&windows, None, None).is_empty());
    }

    #[test]
    fn benefit_filter_requires_any_overlap() {
        let items = vec![acc(1, "A", "X", 0, 2)];
        let hit = FilterCriteria {
            benefit_ids: vec![1, 9],
            ..Default::default()
        };
        let miss = FilterCriteria {
            benefit_ids: vec![9],
            ..Default::default()
        };
        assert_eq!(hit.apply(&items).len(), 1);
        assert!(miss.apply(&items).is_empty());
    }
}
