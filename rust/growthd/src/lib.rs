pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod ipc;
pub mod record;
pub mod repo;
pub mod reward;
pub mod store;
