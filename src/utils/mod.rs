//! Utility modules: developer log capture, JSON conversion, logger, numeric helpers.
pub mod devlog;
pub mod json;
pub mod logger;
pub mod num;
