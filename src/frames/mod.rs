//! Frame store module
//!
//! Serves read-only JSON "frame" documents (weapons, armor, zones, ...)
//! from a configured root directory.

mod catalog;
mod error;
mod reader;

pub use catalog::FrameCatalog;
pub use error::FrameError;
