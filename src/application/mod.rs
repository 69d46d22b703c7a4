pub mod enroll;
pub mod gallery;
pub mod ingest;
pub mod matcher;
pub mod verify;
