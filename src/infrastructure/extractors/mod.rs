pub mod http;
pub mod thumbnail;
