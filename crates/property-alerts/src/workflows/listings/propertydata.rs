use std::fmt;

use tracing::debug;

use super::{ListingError, ListingProvider};
use crate::workflows::search::{PropertyListing, SearchCriteria};

/// Client for the PropertyData listings API.
pub struct PropertyDataClient {
    api_key: String,
}

impl PropertyDataClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for PropertyDataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDataClient")
            .field("api_key_set", &!self.api_key.is_empty())
            .finish()
    }
}

impl ListingProvider for PropertyDataClient {
    fn name(&self) -> &'static str {
        "propertydata"
    }

    // TODO: call the PropertyData search endpoint and map its results once an
    // account with listings access is available.
    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<PropertyListing>, ListingError> {
        debug!(location = %criteria.location, "property data search requested");
        Err(ListingError::NotImplemented)
    }
}
