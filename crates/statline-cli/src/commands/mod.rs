//! CLI command implementations.

pub mod consume;
pub mod log;
pub mod report;
pub mod session;
pub mod state;
pub mod status;
pub mod util;
