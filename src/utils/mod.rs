//! Utility functions and helpers.

pub mod http;
pub mod text;
pub mod uri;

pub use text::sanitize;
pub use uri::{ListLocator, parse_list_locator};
