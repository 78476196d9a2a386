//! User infrastructure module
//!
//! This module provides the in-memory user directory.

mod directory;

pub use directory::InMemoryUserDirectory;
