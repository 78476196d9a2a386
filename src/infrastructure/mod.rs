//! Infrastructure layer - Token signing, persistence and logging

pub mod auth;
pub mod logging;
pub mod session;
pub mod storage;
pub mod user;
