pub mod matcher;
pub mod normalize;
pub mod scorer;

pub use matcher::ClosestMatcher;
pub use normalize::normalize;
pub use scorer::{extract_rating, parse_accommodation_kind, rank, score, ScoredItem};
