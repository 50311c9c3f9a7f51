//! HTTP protocol layer module
//!
//! Response envelope and response builders shared by the dispatcher and middleware.

pub mod envelope;
pub mod response;

// Re-export commonly used types
pub use envelope::Envelope;
pub use response::{build_preflight_response, error_response, json_response};
