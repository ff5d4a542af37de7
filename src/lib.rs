pub mod config;
pub mod engine;
pub mod harness;
pub mod limits;
pub mod model;
pub mod monitor;
pub mod observability;
pub mod report;
