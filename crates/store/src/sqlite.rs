//! Catalog queries over SQLite.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;

use cartons_recon::model::{Band, CartonIdentity, CartonRow, NamePattern, TargetRow, VersionRef};
use cartons_recon::DataSource;

use crate::error::StoreError;
use crate::schema::create_schema;
use crate::seed::Seeder;

const IDENTITY_SQL: &str = r#"
SELECT m.label, c.program, v.pk, v.tag, c.mapper_pk, c.category_pk
FROM carton c
JOIN version v ON v.pk = c.version_pk
LEFT JOIN category cat ON cat.pk = c.category_pk
LEFT JOIN mapper m ON m.pk = c.mapper_pk
WHERE c.carton = ?1 AND v.plan = ?2 AND cat.label IS ?3
ORDER BY c.pk
"#;

const VERSIONS_SQL: &str = "SELECT pk, tag FROM version WHERE plan = ?1 ORDER BY pk";

const TARGETS_SQL: &str = r#"
SELECT ctt.cadence_pk, cad.label, ctt.lambda_eff, ctt.instrument_pk, ins.label,
       ctt.priority, ctt.value,
       mag.g, mag.r, mag.i, mag.z, mag.h, mag.j, mag.k, mag.bp, mag.rp, mag.gaia_g
FROM carton c
JOIN version v ON v.pk = c.version_pk
JOIN carton_to_target ctt ON ctt.carton_pk = c.pk
LEFT JOIN cadence cad ON cad.pk = ctt.cadence_pk
LEFT JOIN instrument ins ON ins.pk = ctt.instrument_pk
LEFT JOIN magnitude mag ON mag.carton_to_target_pk = ctt.pk
WHERE c.carton = ?1 AND v.plan = ?2 AND v.tag = ?3
ORDER BY ctt.pk
"#;

const CARTONS_NAMED_SQL: &str = r#"
SELECT c.carton, v.plan, cat.label, v.pk, v.tag, c.program
FROM carton c
JOIN version v ON v.pk = c.version_pk
LEFT JOIN category cat ON cat.pk = c.category_pk
WHERE c.carton = ?1
ORDER BY c.pk
"#;

const CARTONS_LIKE_SQL: &str = r#"
SELECT c.carton, v.plan, cat.label, v.pk, v.tag, c.program
FROM carton c
JOIN version v ON v.pk = c.version_pk
LEFT JOIN category cat ON cat.pk = c.category_pk
WHERE c.carton LIKE ?1 ESCAPE '\'
ORDER BY c.pk
"#;

/// Index of the first magnitude column in [`TARGETS_SQL`]; the rest follow
/// in [`Band::ALL`] order.
const FIRST_MAG_COLUMN: usize = 7;

/// A catalog backed by a SQLite database.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open an existing catalog read-only.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|source| {
            StoreError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), "opened catalog");
        Ok(Self { conn })
    }

    /// Create (or extend) a writable catalog file with the full schema.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Empty in-memory catalog with the full schema.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Insert helpers for fixtures. Fails on read-only catalogs.
    pub fn seeder(&self) -> Seeder<'_> {
        Seeder::new(&self.conn)
    }

    fn carton_rows(&self, sql: &str, arg: &str) -> Result<Vec<CartonRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![arg], |row| {
            Ok(CartonRow {
                name: row.get(0)?,
                plan: row.get(1)?,
                category: row.get(2)?,
                version_id: row.get(3)?,
                tag: row.get(4)?,
                program: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

fn target_row(row: &Row<'_>) -> rusqlite::Result<TargetRow> {
    let mut target = TargetRow {
        cadence_id: row.get(0)?,
        cadence_label: row.get(1)?,
        lambda_eff: row.get(2)?,
        instrument_id: row.get(3)?,
        instrument_label: row.get(4)?,
        priority: row.get(5)?,
        value: row.get(6)?,
        ..TargetRow::default()
    };
    for (offset, band) in Band::ALL.iter().enumerate() {
        target.magnitudes.set(*band, row.get(FIRST_MAG_COLUMN + offset)?);
    }
    Ok(target)
}

impl DataSource for SqliteSource {
    type Error = StoreError;

    fn carton_identities(
        &self,
        carton: &str,
        plan: &str,
        category: Option<&str>,
    ) -> Result<Vec<CartonIdentity>, Self::Error> {
        let mut stmt = self.conn.prepare_cached(IDENTITY_SQL)?;
        let rows = stmt.query_map(params![carton, plan, category], |row| {
            Ok(CartonIdentity {
                mapper_label: row.get(0)?,
                program: row.get(1)?,
                version_id: row.get(2)?,
                tag: row.get(3)?,
                mapper_id: row.get(4)?,
                category_id: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn versions_for_plan(&self, plan: &str) -> Result<Vec<VersionRef>, Self::Error> {
        let mut stmt = self.conn.prepare_cached(VERSIONS_SQL)?;
        let rows = stmt.query_map(params![plan], |row| {
            Ok(VersionRef {
                version_id: row.get(0)?,
                tag: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn target_rows(&self, carton: &str, plan: &str, tag: &str) -> Result<Vec<TargetRow>, Self::Error> {
        let mut stmt = self.conn.prepare_cached(TARGETS_SQL)?;
        let rows = stmt.query_map(params![carton, plan, tag], target_row)?;
        let rows: Vec<TargetRow> = rows.collect::<Result<_, _>>()?;
        debug!(carton, plan, tag, targets = rows.len(), "fetched target rows");
        Ok(rows)
    }

    fn cartons_named(&self, carton: &str) -> Result<Vec<CartonRow>, Self::Error> {
        self.carton_rows(CARTONS_NAMED_SQL, carton)
    }

    fn cartons_matching(&self, pattern: &NamePattern) -> Result<Vec<CartonRow>, Self::Error> {
        self.carton_rows(CARTONS_LIKE_SQL, &pattern.to_sql_like())
    }
}
