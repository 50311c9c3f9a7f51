//! Request handler module
//!
//! Responsible for request routing dispatch and the endpoint logic:
//! frame lookups, the `/test` probes, torrent search and `/hello`.

pub mod endpoints;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
