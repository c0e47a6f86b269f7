//! `cartons-store`: SQLite implementation of the catalog [`DataSource`].
//!
//! [`DataSource`]: cartons_recon::DataSource

pub mod error;
pub mod schema;
pub mod seed;
pub mod sqlite;

pub use error::StoreError;
pub use seed::Seeder;
pub use sqlite::SqliteSource;
