//! Pipeline entry points.
//!
//! - `login`: open a session from `Credentials`
//! - `run_fetch`: collect posts for a `Target`
//! - `run_export`: write the collected posts

pub mod fetch;
pub mod session;

pub use fetch::{FetchReport, Target, parse_handles, read_handles_file, run_export, run_fetch};
pub use session::{Credentials, login};
