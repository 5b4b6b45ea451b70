use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

pub const DEFAULT_LIMIT: usize = 10;

/// Zero-indexed page slice with bounds clamping: a start past the end yields
/// an empty page, an end past the end is truncated to the remainder.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Vec<T> {
    let start = page.saturating_mul(limit);
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(limit).min(items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_pages() {
        let items: Vec<i32> = (0..25).collect();
        assert_eq!(paginate(&items, 0, 10), (0..10).collect::<Vec<_>>());
        assert_eq!(paginate(&items, 2, 10), (20..25).collect::<Vec<_>>());
        assert_eq!(paginate(&items, 3, 10), Vec::<i32>::new());
    }

    #[test]
    fn first_page_is_idempotent() {
        let items: Vec<i32> = (0..25).collect();
        let once = paginate(&items, 0, 10);
        assert_eq!(paginate(&once, 0, 10), once);
    }
}
