pub mod domain;

pub use domain::{PropertyListing, PropertyType, PropertyTypeFilter, SearchCriteria};
