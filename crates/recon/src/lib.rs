//! `cartons-recon`: carton inventory engine.
//!
//! Pure engine crate: resolves requested cartons against a catalog behind the
//! [`DataSource`] trait, summarizes their targets, classifies magnitude
//! outliers and proposes alternatives for cartons the catalog does not hold.
//! No CLI or file IO dependencies.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod outliers;
pub mod reconcile;
pub mod record;
pub mod render;
pub mod selection;
pub mod source;

pub use config::InventoryConfig;
pub use error::ReconError;
pub use model::{CartonIdentity, CartonRequest, CartonRow, Computation, NamePattern, Summaries, TargetRow};
pub use reconcile::{check_existence, AlternativeRow, AlternativesTable};
pub use record::{AssignReport, CartonRecord, TargetInfo};
pub use render::{report_header, ReportRow};
pub use selection::{select_cartons, SelectionPolicy, VersionMode};
pub use source::{DataSource, MemorySource};
