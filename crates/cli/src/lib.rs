//! `cartons-cli`: batch runner behind the `cartons-inventory` binary.

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod plan;
pub mod process;
pub mod settings;

pub use error::CliError;
