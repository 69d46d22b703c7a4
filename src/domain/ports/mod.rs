pub mod embedding_store;
pub mod feature_extractor;
