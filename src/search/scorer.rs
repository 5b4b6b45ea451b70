//! Composite relevance scoring for free-text accommodation search.
//!
//! Each candidate is scored independently from read-only inputs: a weighted
//! sum of kind match, explicit star rating, province/ward closest match and
//! benefit-name overlap. Zero-scoring candidates are dropped and the rest
//! ranked descending, preserving the original order on ties.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::warn;

use super::matcher::{similarity, ClosestMatcher};
use super::normalize::normalize;
use crate::models::{AccommodationView, Benefit, KIND_HOMESTAY, KIND_HOTEL, KIND_VILLA};

pub const KIND_WEIGHT: i32 = 20;
pub const RATING_WEIGHT: i32 = 15;
pub const PROVINCE_WEIGHT: i32 = 13;
pub const WARD_WEIGHT: i32 = 1;
pub const BENEFIT_WEIGHT: i32 = 4;
pub const BENEFIT_CAP: i32 = 12;

/// Upper bound on concurrent scoring tasks for one request, so a large
/// unfiltered snapshot cannot fan out without limit.
pub const SCORE_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem<T> {
    pub item: T,
    pub score: i32,
}

fn rating_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*sao").expect("rating regex"))
}

/// Star rating mentioned in the query ("4 sao"), if any.
pub fn extract_rating(query: &str) -> Option<i32> {
    rating_regex()
        .captures(query)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Map query keywords onto an accommodation kind, plus any star rating.
/// Expects a normalized query. Hotel keywords win over homestay over villa.
pub fn parse_accommodation_kind(query: &str) -> (Option<i32>, Option<i32>) {
    let rating = extract_rating(query);
    let groups: [(&[&str], i32); 3] = [
        (&["khach san", "hotel", "ks"], KIND_HOTEL),
        (&["homestay", "can ho", "nha"], KIND_HOMESTAY),
        (&["villa", "biet thu", "nha nguyen can"], KIND_VILLA),
    ];

    for (keywords, kind) in groups {
        let matcher = ClosestMatcher::new(keywords.iter().map(|k| k.to_string()));
        if let Some(best) = matcher.closest(query) {
            if query.contains(best) {
                return (Some(kind), rating);
            }
        }
    }
    (None, rating)
}

/// Composite score for one candidate against a normalized query.
pub fn score(
    query: &str,
    acc: &AccommodationView,
    cm_province: &ClosestMatcher,
    cm_ward: &ClosestMatcher,
) -> i32 {
    let (kind, rating) = parse_accommodation_kind(query);
    let mut total = 0;

    if kind == Some(acc.kind) {
        total += KIND_WEIGHT;
    }
    if rating == Some(acc.num) {
        total += RATING_WEIGHT;
    }
    if cm_province.closest(query) == Some(normalize(&acc.province).as_str()) {
        total += PROVINCE_WEIGHT;
    }
    if cm_ward.closest(query) == Some(normalize(&acc.ward).as_str()) {
        total += WARD_WEIGHT;
    }
    total + benefit_score(query, &acc.benefits)
}

fn benefit_score(query: &str, benefits: &[Benefit]) -> i32 {
    let mut total = 0;
    for benefit in benefits {
        let name = normalize(&benefit.name);
        if name.is_empty() {
            continue;
        }
        if similarity(query, &name) > 0.7 || query.contains(&name) {
            total += BENEFIT_WEIGHT;
            if total >= BENEFIT_CAP {
                break;
            }
        }
    }
    total.min(BENEFIT_CAP)
}

/// Score every candidate and return the positive scorers ranked descending.
///
/// Candidates are split into at most `SCORE_CONCURRENCY` chunks scored in
/// parallel; ties keep the candidates' original relative order.
pub async fn rank(
    query: &str,
    items: Vec<AccommodationView>,
) -> Vec<ScoredItem<AccommodationView>> {
    if items.is_empty() {
        return Vec::new();
    }

    let query = Arc::new(normalize(query));
    let cm_province = Arc::new(ClosestMatcher::new(unique_field(&items, |a| &a.province)));
    let cm_ward = Arc::new(ClosestMatcher::new(unique_field(&items, |a| &a.ward)));

    let chunk_size = items.len().div_ceil(SCORE_CONCURRENCY);
    let mut set = JoinSet::new();
    let mut indexed: Vec<(usize, AccommodationView)> = items.into_iter().enumerate().collect();

    while !indexed.is_empty() {
        let rest = indexed.split_off(chunk_size.min(indexed.len()));
        let chunk = std::mem::replace(&mut indexed, rest);
        let query = Arc::clone(&query);
        let cm_province = Arc::clone(&cm_province);
        let cm_ward = Arc::clone(&cm_ward);
        set.spawn(async move {
            chunk
                .into_iter()
                .map(|(idx, item)| {
                    let s = score(&query, &item, &cm_province, &cm_ward);
                    (idx, s, item)
                })
                .collect::<Vec<_>>()
        });
    }

    let mut scored = Vec::new();
    while let Some(result) = set.join_next().await {
        match result {
            Ok(chunk) => scored.extend(chunk),
            Err(e) => warn!("Scoring task failed: {}", e),
        }
    }

    scored.sort_by_key(|(idx, _, _)| *idx);
    scored.retain(|(_, s, _)| *s > 0);
    scored.sort_by(|a, b| b.1.cmp(&a.1)); // stable: ties keep original order
    scored
        .into_iter()
        .map(|(_, score, item)| ScoredItem { item, score })
        .collect()
}

fn unique_field<F>(items: &[AccommodationView], field: F) -> Vec<String>
where
    F: Fn(&AccommodationView) -> &str,
{
    let mut values = Vec::new();
    for item in items {
        let value = normalize(field(item));
        if !value.is_empty() && !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candidate(kind: i32, num: i32, province: &str, ward: &str, benefits: &[&str]) -> AccommodationView {
        let now = Utc::now();
        AccommodationView {
            id: 1,
            kind,
            user_id: 1,
            name: "Test".into(),
            address: String::new(),
            avatar: String::new(),
            short_description: String::new(),
            status: 0,
            num,
            people: 2,
            price: 100,
            num_bed: 1,
            num_tolet: 1,
            province: province.into(),
            district: String::new(),
            ward: ward.into(),
            longitude: 0.0,
            latitude: 0.0,
            benefits: benefits
                .iter()
                .enumerate()
                .map(|(i, name)| Benefit {
                    id: i as i32 + 1,
                    name: (*name).into(),
                    status: 0,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rating_is_extracted_from_sao_phrases() {
        assert_eq!(extract_rating("khach san 4 sao vung tau"), Some(4));
        assert_eq!(extract_rating("khach san 5sao"), Some(5));
        assert_eq!(extract_rating("homestay da lat"), None);
    }

    #[test]
    fn keywords_map_to_kinds() {
        assert_eq!(parse_accommodation_kind("khach san 4 sao").0, Some(KIND_HOTEL));
        assert_eq!(parse_accommodation_kind("homestay gia re").0, Some(KIND_HOMESTAY));
        assert_eq!(parse_accommodation_kind("thue villa bien").0, Some(KIND_VILLA));
    }

    #[test]
    fn four_star_hotel_in_vung_tau_scores_at_least_48() {
        let acc = candidate(KIND_HOTEL, 4, "Vũng Tàu", "Phường 1", &[]);
        let query = normalize("khách sạn 4 sao Vũng Tàu");
        let cm_province = ClosestMatcher::new([normalize(&acc.province)]);
        let cm_ward = ClosestMatcher::new([normalize(&acc.ward)]);
        assert!(score(&query, &acc, &cm_province, &cm_ward) >= 48);
    }

    #[test]
    fn matching_more_signals_scores_strictly_higher() {
        let query = normalize("khách sạn 4 sao Vũng Tàu hồ bơi");
        let full = candidate(KIND_HOTEL, 4, "Vũng Tàu", "", &["Hồ bơi"]);
        let partial = candidate(KIND_HOTEL, 3, "Đà Lạt", "", &[]);
        let cm_province = ClosestMatcher::new(["vung tau".to_string(), "da lat".to_string()]);
        let cm_ward = ClosestMatcher::new(Vec::<String>::new());

        let high = score(&query, &full, &cm_province, &cm_ward);
        let low = score(&query, &partial, &cm_province, &cm_ward);
        assert!(high > low, "expected {} > {}", high, low);
    }

    #[test]
    fn benefit_contribution_is_capped() {
        let names = ["ho boi", "bai do xe", "wifi", "gym", "spa"];
        let acc = candidate(KIND_HOTEL, 4, "Vũng Tàu", "", &names);
        let query = "ho boi bai do xe wifi gym spa";
        assert!(benefit_score(query, &acc.benefits) <= BENEFIT_CAP);
    }

    #[tokio::test]
    async fn rank_drops_zero_scores_and_sorts_descending() {
        let items = vec![
            candidate(KIND_HOMESTAY, 0, "Hà Nội", "", &[]),
            candidate(KIND_HOTEL, 4, "Vũng Tàu", "", &[]),
            candidate(KIND_HOTEL, 2, "Vũng Tàu", "", &[]),
        ];
        let ranked = rank("khách sạn 4 sao Vũng Tàu", items).await;
        assert!(!ranked.is_empty());
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(ranked[0].item.num, 4);
        assert!(ranked.iter().all(|s| s.score > 0));
    }
}
