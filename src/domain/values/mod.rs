pub mod distance;
pub mod identity;
pub mod image_kind;
pub mod match_result;
pub mod threshold;
