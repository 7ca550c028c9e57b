//! Error handling module for the tool bridge

mod error;

pub use error::{BridgeError, Result};
