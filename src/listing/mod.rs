pub mod filter;
pub mod paginate;

pub use filter::{busy_accommodations, decode_param, FilterCriteria};
pub use paginate::{paginate, Pagination, DEFAULT_LIMIT};
