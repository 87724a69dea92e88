pub mod learning_item;
pub mod recommendation;

pub use learning_item::{ItemStatus, ItemType, LearningItem, LearningItemRow};
pub use recommendation::{Recommendation, RecommendationResponse};
