//! LIR loader - Common Types and Utilities
//! 
//! This crate contains the error type and document location tracking
//! shared by the IR crate and the command-line driver.

pub mod error;
pub mod doc_path;

pub use error::LoadError;
pub use doc_path::{DocPath, PathSegment};
