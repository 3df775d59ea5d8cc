//! Public library modules for the CLI crate
pub mod logging;
pub mod report;
