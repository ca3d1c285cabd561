mod mock;
mod propertydata;

use std::fmt::Debug;

use tracing::info;

use crate::config::ListingConfig;
use crate::workflows::search::{PropertyListing, SearchCriteria};

pub use mock::MockListingProvider;
pub use propertydata::PropertyDataClient;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// The real data source has not been wired up yet. Rows failing this way
    /// are flagged so the console can point at `USE_MOCK_API`.
    #[error("property data API is not implemented; set USE_MOCK_API=true to use generated listings")]
    NotImplemented,
    #[error("invalid search criteria: {0}")]
    InvalidCriteria(String),
}

pub trait ListingProvider: Debug {
    fn name(&self) -> &'static str;
    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PropertyListing>, ListingError>;
}

/// Picks the provider once at startup; callers only see the trait object.
pub fn provider_for(config: &ListingConfig) -> Box<dyn ListingProvider> {
    let provider: Box<dyn ListingProvider> = if config.use_mock {
        Box::new(MockListingProvider::new())
    } else {
        Box::new(PropertyDataClient::new(config.api_key.clone()))
    };
    info!(provider = provider.name(), "listing provider selected");
    provider
}
