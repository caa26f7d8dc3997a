pub mod api;
pub mod config;
pub mod decode;
pub mod error;
pub mod http_client;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod query;
pub mod store;
