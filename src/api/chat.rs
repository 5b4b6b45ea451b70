//! Conversational search over the cached accommodation snapshot.
//!
//! Each turn extracts a partial filter set from the message, merges it with
//! the session's stored state, applies the merged filters to the cached
//! snapshot and fuzzy-ranks whatever free text remains. A reset turn clears
//! the stored state.

use std::sync::{Arc, OnceLock};

use axum::{extract::State, http::HeaderMap, Json};
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::api::accommodations::{cached_accommodations, cached_statuses};
use crate::api::common::{ApiError, Envelope};
use crate::cache::filters::{
    clear_last_filters, get_last_filters, save_last_filters, SearchFilterState,
};
use crate::listing::{busy_accommodations, paginate, FilterCriteria, Pagination, DEFAULT_LIMIT};
use crate::middleware::auth::user_from_headers;
use crate::models::AccommodationView;
use crate::search::{normalize, parse_accommodation_kind, rank, ClosestMatcher};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatSearchPayload {
    #[validate(length(min = 1))]
    pub session_id: String,
    #[validate(length(min = 1))]
    pub message: String,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

const RESET_PHRASES: [&str; 3] = ["reset", "dat lai", "lam moi"];

fn price_max_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:duoi|toi da)\s*(\d+)").expect("price max regex"))
}

fn price_min_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:tren|toi thieu)\s*(\d+)").expect("price min regex"))
}

fn capture_i64(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract a partial filter set from a normalized message. Provinces are
/// matched against the values present in the snapshot.
fn extract_filters(normalized: &str, provinces: &[String]) -> SearchFilterState {
    let (kind, _) = parse_accommodation_kind(normalized);
    let province = ClosestMatcher::new(provinces.iter().cloned())
        .closest(normalized)
        .map(str::to_string);
    SearchFilterState {
        kind,
        province,
        price_min: capture_i64(price_min_regex(), normalized),
        price_max: capture_i64(price_max_regex(), normalized),
        ..Default::default()
    }
}

/// A chat turn always answers with something to show: when no candidate
/// scores above zero the filtered list is returned unranked instead of an
/// empty page.
fn ranked_or_filtered<T>(ranked: Vec<T>, filtered: Vec<T>) -> Vec<T> {
    if ranked.is_empty() {
        filtered
    } else {
        ranked
    }
}

fn distinct_provinces(items: &[AccommodationView]) -> Vec<String> {
    let mut provinces = Vec::new();
    for item in items {
        let value = normalize(&item.province);
        if !value.is_empty() && !provinces.contains(&value) {
            provinces.push(value);
        }
    }
    provinces
}

pub async fn chat_search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatSearchPayload>,
) -> Result<Json<Envelope<Vec<AccommodationView>>>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = user_from_headers(&headers);
    let normalized = normalize(&payload.message);

    if RESET_PHRASES.contains(&normalized.as_str()) {
        clear_last_filters(state.store.as_ref(), user.user_id, &payload.session_id)
            .await
            .map_err(ApiError::Internal)?;
        return Ok(Json(Envelope {
            code: crate::api::common::CODE_SUCCESS,
            mess: "filters cleared".to_string(),
            data: Some(Vec::new()),
            pagination: None,
        }));
    }

    let snapshot = cached_accommodations(&state, user).await?;

    let extracted = extract_filters(&normalized, &distinct_provinces(&snapshot));
    let stored = get_last_filters(state.store.as_ref(), user.user_id, &payload.session_id).await;
    let merged = SearchFilterState::merge(&stored, extracted);
    if let Err(e) =
        save_last_filters(state.store.as_ref(), user.user_id, &payload.session_id, &merged).await
    {
        tracing::warn!("Could not persist filter state: {}", e);
    }

    let mut criteria = FilterCriteria::from_filter_state(&merged);
    if merged.from_date.is_some() && merged.to_date.is_some() {
        let windows = cached_statuses(&state).await?;
        criteria.excluded_ids = busy_accommodations(&windows, merged.from_date, merged.to_date);
    }
    let filtered = criteria.apply(&snapshot);

    let ranked: Vec<AccommodationView> = rank(&normalized, filtered.clone())
        .await
        .into_iter()
        .map(|scored| scored.item)
        .collect();
    let results = ranked_or_filtered(ranked, filtered);

    let page = payload.page.or(merged.page).unwrap_or(0);
    let limit = payload.limit.or(merged.limit).unwrap_or(DEFAULT_LIMIT);
    let total = results.len();
    let items = paginate(&results, page, limit);
    Ok(Json(Envelope::success_paged(items, Pagination { page, limit, total })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KIND_HOMESTAY, KIND_HOTEL};

    #[test]
    fn extracts_kind_province_and_price_bounds() {
        let provinces = vec!["vung tau".to_string(), "da lat".to_string()];
        let filters = extract_filters("khach san vung tau duoi 800", &provinces);
        assert_eq!(filters.kind, Some(KIND_HOTEL));
        assert_eq!(filters.province.as_deref(), Some("vung tau"));
        assert_eq!(filters.price_max, Some(800));
        assert_eq!(filters.price_min, None);
    }

    #[test]
    fn extracts_minimum_price() {
        let filters = extract_filters("homestay tren 300", &[]);
        assert_eq!(filters.kind, Some(KIND_HOMESTAY));
        assert_eq!(filters.price_min, Some(300));
    }

    #[test]
    fn zero_score_turn_falls_back_to_the_filtered_list() {
        let filtered = vec![1, 2, 3];
        assert_eq!(ranked_or_filtered(Vec::new(), filtered.clone()), filtered);
        assert_eq!(ranked_or_filtered(vec![9], filtered), vec![9]);
    }

    #[test]
    fn reset_phrases_survive_normalization() {
        assert!(RESET_PHRASES.contains(&normalize("Đặt lại").as_str()));
        assert!(RESET_PHRASES.contains(&normalize("  RESET ").as_str()));
    }
}
