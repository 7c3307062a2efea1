pub mod cache;
pub mod db;
pub mod memory_store;
pub mod pg_store;
pub mod store;
