//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the opaque key-value contract used for snapshot storage.
//! - Isolate SQLite query details from the task store.
//!
//! # Invariants
//! - Repository APIs are synchronous; async adaptation lives in `gateway`.

pub mod kv_repo;
