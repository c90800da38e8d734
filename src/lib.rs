//! Terminal tracker for time blocks. Log blocks of focused time against
//! life areas, set monthly targets per area and block type, and check
//! aggregate progress on a dashboard without leaving the terminal.
//!

pub mod cli;
pub mod dashboard;
pub mod store;
pub mod utils;
