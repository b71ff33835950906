pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http_client;
pub mod ingest;
pub mod league;
pub mod merge;
pub mod player;
pub mod position;
pub mod store;
pub mod tables;
