pub mod alerts;
pub mod criteria;
pub mod digest;
pub mod listings;
pub mod search;
