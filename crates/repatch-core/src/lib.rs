//! Shared data model and error taxonomy for the repatch workspace.

pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::*;
