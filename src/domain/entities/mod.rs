pub mod embedding_record;
pub mod snapshot;
