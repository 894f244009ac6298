pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod probe;
pub mod sign;
pub mod types;

pub use client::AffiliateClient;
pub use error::AffiliateError;
pub use extract::extract_products;
pub use normalize::normalize_product;
pub use probe::{probe, ProbeReport, ProbeRequest};
pub use types::{Credentials, SearchQuery, SortOrder};
