// Catalog schema. Mirrors the subset of targetdb the inventory reads.

use rusqlite::Connection;

use crate::error::StoreError;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS version (
    pk INTEGER PRIMARY KEY,
    plan TEXT NOT NULL,
    tag TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    pk INTEGER PRIMARY KEY,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mapper (
    pk INTEGER PRIMARY KEY,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS carton (
    pk INTEGER PRIMARY KEY,
    carton TEXT NOT NULL,
    version_pk INTEGER NOT NULL REFERENCES version(pk),
    category_pk INTEGER REFERENCES category(pk),   -- NULL = uncategorized
    mapper_pk INTEGER REFERENCES mapper(pk),       -- NULL = no mapper
    program TEXT
);

CREATE TABLE IF NOT EXISTS cadence (
    pk INTEGER PRIMARY KEY,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS instrument (
    pk INTEGER PRIMARY KEY,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS carton_to_target (
    pk INTEGER PRIMARY KEY,
    carton_pk INTEGER NOT NULL REFERENCES carton(pk),
    cadence_pk INTEGER REFERENCES cadence(pk),
    instrument_pk INTEGER REFERENCES instrument(pk),
    lambda_eff REAL,
    priority INTEGER,
    value REAL
);

CREATE TABLE IF NOT EXISTS magnitude (
    pk INTEGER PRIMARY KEY,
    carton_to_target_pk INTEGER NOT NULL REFERENCES carton_to_target(pk),
    g REAL,
    r REAL,
    i REAL,
    z REAL,
    h REAL,
    j REAL,
    k REAL,
    bp REAL,
    rp REAL,
    gaia_g REAL
);

CREATE INDEX IF NOT EXISTS idx_carton_name ON carton(carton);
CREATE INDEX IF NOT EXISTS idx_ctt_carton ON carton_to_target(carton_pk);
CREATE INDEX IF NOT EXISTS idx_magnitude_ctt ON magnitude(carton_to_target_pk);
"#;

/// Create every catalog table that does not exist yet.
pub fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
