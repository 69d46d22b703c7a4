pub mod embedding_store;
