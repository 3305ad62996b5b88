pub mod classify;
pub mod export;
pub mod ingest;
pub mod sample;
pub mod schemas;
pub mod validate;
