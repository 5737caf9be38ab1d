/// Built-in catalog and tracked corrections.
pub mod defaults;
/// Remote document database contract and backends.
pub mod document_store;
/// Local string key-value persistence.
pub mod keyvalue;
/// Persisted model definitions.
pub mod models;
/// Storage error types shared by backends.
pub mod storage;
