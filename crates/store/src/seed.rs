//! Insert helpers used to build catalog fixtures.
//!
//! Reference tables (category, mapper, cadence, instrument) are filled on
//! demand: an explicit id is inserted as-is, a bare label reuses the first row
//! carrying that label or creates one.

use rusqlite::{params, Connection, OptionalExtension};

use cartons_recon::model::{Band, TargetRow};
use cartons_recon::source::CartonEntry;

use crate::error::StoreError;

pub struct Seeder<'a> {
    conn: &'a Connection,
}

impl<'a> Seeder<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn version(&self, plan: &str, tag: &str) -> Result<i64, StoreError> {
        self.conn
            .execute("INSERT INTO version (plan, tag) VALUES (?1, ?2)", params![plan, tag])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn version_with_id(&self, pk: i64, plan: &str, tag: &str) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO version (pk, plan, tag) VALUES (?1, ?2, ?3)",
            params![pk, plan, tag],
        )?;
        Ok(pk)
    }

    /// Insert a carton and return its primary key.
    pub fn carton(&self, entry: &CartonEntry) -> Result<i64, StoreError> {
        let category_pk = self.reference("category", entry.category_id, entry.category.as_deref())?;
        let mapper_pk = self.reference("mapper", entry.mapper_id, entry.mapper_label.as_deref())?;
        self.conn.execute(
            "INSERT INTO carton (carton, version_pk, category_pk, mapper_pk, program) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.name, entry.version_id, category_pk, mapper_pk, entry.program],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Assign a target to a carton. A magnitude row is written only when at
    /// least one band has a value.
    pub fn target(&self, carton_pk: i64, row: &TargetRow) -> Result<i64, StoreError> {
        let cadence_pk = self.reference("cadence", row.cadence_id, row.cadence_label.as_deref())?;
        let instrument_pk = self.reference("instrument", row.instrument_id, row.instrument_label.as_deref())?;
        self.conn.execute(
            "INSERT INTO carton_to_target (carton_pk, cadence_pk, instrument_pk, lambda_eff, priority, value) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![carton_pk, cadence_pk, instrument_pk, row.lambda_eff, row.priority, row.value],
        )?;
        let ctt_pk = self.conn.last_insert_rowid();

        if Band::ALL.iter().any(|b| row.magnitudes.get(*b).is_some()) {
            let m = &row.magnitudes;
            self.conn.execute(
                "INSERT INTO magnitude (carton_to_target_pk, g, r, i, z, h, j, k, bp, rp, gaia_g) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![ctt_pk, m.g, m.r, m.i, m.z, m.h, m.j, m.k, m.bp, m.rp, m.gaia_g],
            )?;
        }
        Ok(ctt_pk)
    }

    /// Resolve a reference-table row from an id and/or label.
    fn reference(&self, table: &'static str, id: Option<i64>, label: Option<&str>) -> Result<Option<i64>, StoreError> {
        match (id, label) {
            (Some(pk), label) => {
                self.conn.execute(
                    &format!("INSERT OR IGNORE INTO {table} (pk, label) VALUES (?1, ?2)"),
                    params![pk, label.unwrap_or_default()],
                )?;
                Ok(Some(pk))
            }
            (None, Some(label)) => {
                let existing: Option<i64> = self
                    .conn
                    .query_row(
                        &format!("SELECT pk FROM {table} WHERE label = ?1 ORDER BY pk LIMIT 1"),
                        params![label],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(pk) = existing {
                    return Ok(Some(pk));
                }
                self.conn
                    .execute(&format!("INSERT INTO {table} (label) VALUES (?1)"), params![label])?;
                Ok(Some(self.conn.last_insert_rowid()))
            }
            (None, None) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteSource;
    use cartons_recon::DataSource;

    #[test]
    fn labels_are_reused() {
        let source = SqliteSource::open_in_memory().unwrap();
        let seed = source.seeder();
        let v = seed.version("1.0.0", "1.0.1").unwrap();
        for name in ["a", "b"] {
            seed.carton(&CartonEntry {
                name: name.into(),
                version_id: v,
                category: Some("science".into()),
                mapper_label: Some("MWM".into()),
                ..CartonEntry::default()
            })
            .unwrap();
        }
        let a = source.carton_identities("a", "1.0.0", Some("science")).unwrap();
        let b = source.carton_identities("b", "1.0.0", Some("science")).unwrap();
        assert_eq!(a[0].category_id, b[0].category_id);
        assert_eq!(a[0].mapper_id, b[0].mapper_id);
    }

    #[test]
    fn explicit_ids_are_kept() {
        let source = SqliteSource::open_in_memory().unwrap();
        let seed = source.seeder();
        let v = seed.version_with_id(42, "1.0.0", "1.0.1").unwrap();
        let c = seed
            .carton(&CartonEntry {
                name: "a".into(),
                version_id: v,
                ..CartonEntry::default()
            })
            .unwrap();
        seed.target(
            c,
            &TargetRow {
                cadence_id: Some(7),
                cadence_label: Some("dark_1x3".into()),
                ..TargetRow::default()
            },
        )
        .unwrap();
        let rows = source.target_rows("a", "1.0.0", "1.0.1").unwrap();
        assert_eq!(rows[0].cadence_id, Some(7));
        assert_eq!(rows[0].cadence_label.as_deref(), Some("dark_1x3"));
    }
}
