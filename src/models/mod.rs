pub mod game;
pub mod user_profile;

pub use game::{Game, RawRecord};
pub use user_profile::{CategoryCount, Insights, Recommendation, UserProfile};
