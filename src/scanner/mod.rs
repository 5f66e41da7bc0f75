//! Scan-and-probe engine: asset collection, credential extraction, backend
//! schema discovery, and per-resource permission probing.

pub mod assets;
pub mod extract;
pub mod fetcher;
pub mod probe;
pub mod schema;
