pub mod aggregate;
pub mod collector;
pub mod config;
pub mod driver;
pub mod errors;
pub mod report;
pub mod runner;
pub mod types;
