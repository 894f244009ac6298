use std::future::Future;

use giftrec_affiliate::{AffiliateClient, AffiliateError, SearchQuery};
use giftrec_core::CanonicalItem;

/// Anything that can answer a product query with normalized items.
///
/// The live implementation is [`AffiliateClient`]; tests substitute an
/// in-memory source that records every query it receives.
pub trait ProductSource {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<CanonicalItem>, AffiliateError>> + Send;

    /// Whether credentials are present. Only reported, never enforced here.
    fn is_configured(&self) -> bool {
        true
    }
}

impl ProductSource for AffiliateClient {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<CanonicalItem>, AffiliateError>> + Send {
        self.search_products(query)
    }

    fn is_configured(&self) -> bool {
        AffiliateClient::is_configured(self)
    }
}
