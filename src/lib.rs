//! Ingests live-chat packets forwarded from a streaming page, extracts the
//! text chat messages they carry, and stores them in SQLite alongside an
//! optional raw NDJSON log.

pub mod audit;
pub mod bus;
pub mod chat;
pub mod config;
pub mod entity;
pub mod error;
pub mod extract;
pub mod heartbeat;
pub mod ingest;
pub mod run;
pub mod server;
pub mod store;
