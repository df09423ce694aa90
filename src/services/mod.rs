pub mod acquirer;
pub mod catalog;
pub mod normalizer;
pub mod providers;
pub mod recommendations;

pub use acquirer::{Acquisition, FeedAcquirer};
pub use catalog::CatalogService;
pub use normalizer::Normalizer;
pub use recommendations::RecommendationEngine;
