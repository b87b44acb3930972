use camino::Utf8Path;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use tracing::debug;

use super::{TableStore, placeholders, yearly_columns, yearly_table_definition};
use crate::domain::{GeoShape, SHAPE_TABLE, YEARLY_TABLE, YearlyRecord};
use crate::error::SyncError;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| SyncError::Filesystem(err.to_string()))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&self) -> Result<(), SyncError> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {YEARLY_TABLE} ({yearly});
            CREATE TABLE IF NOT EXISTS {SHAPE_TABLE} (
              geoid TEXT NOT NULL,
              name TEXT NOT NULL,
              geometry TEXT NOT NULL
            );
            "#,
            yearly = yearly_table_definition("INTEGER"),
        ))?;
        Ok(())
    }

    fn select_yearly(
        &self,
        filter: &str,
        values: &[Value],
    ) -> Result<Vec<YearlyRecord>, SyncError> {
        let sql = format!(
            "SELECT {} FROM {YEARLY_TABLE}{filter} ORDER BY year, geoid",
            yearly_columns()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(values.iter()), read_yearly)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(geoid, year, counts)| -> Result<YearlyRecord, SyncError> {
                Ok(YearlyRecord::from_counts(geoid.parse()?, year, counts))
            })
            .collect()
    }
}

fn read_yearly(row: &Row<'_>) -> rusqlite::Result<(String, i64, [i64; 11])> {
    let mut counts = [0i64; 11];
    for (offset, slot) in counts.iter_mut().enumerate() {
        *slot = row.get(offset + 2)?;
    }
    Ok((row.get(0)?, row.get(1)?, counts))
}

impl TableStore for SqliteStore {
    fn yearly_rows(&mut self, year: i64) -> Result<Vec<YearlyRecord>, SyncError> {
        self.select_yearly(" WHERE year = ?1", &[Value::Integer(year)])
    }

    fn yearly_table(&mut self) -> Result<Vec<YearlyRecord>, SyncError> {
        self.select_yearly("", &[])
    }

    fn insert_yearly(&mut self, rows: &[YearlyRecord]) -> Result<(), SyncError> {
        let sql = format!(
            "INSERT INTO {YEARLY_TABLE} ({}) VALUES ({})",
            yearly_columns(),
            placeholders('?', 13)
        );
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let mut values = vec![
                    Value::Text(row.geoid.as_str().to_string()),
                    Value::Integer(row.year),
                ];
                values.extend(row.counts().into_iter().map(Value::Integer));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        debug!(rows = rows.len(), table = YEARLY_TABLE, "inserted batch");
        Ok(())
    }

    fn shape_table(&mut self) -> Result<Vec<GeoShape>, SyncError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT geoid, name, geometry FROM {SHAPE_TABLE} ORDER BY geoid"
        ))?;
        let shapes = stmt
            .query_map([], |row| {
                Ok(GeoShape {
                    geoid: row.get(0)?,
                    name: row.get(1)?,
                    geometry: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shapes)
    }

    fn insert_shapes(&mut self, rows: &[GeoShape]) -> Result<(), SyncError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {SHAPE_TABLE} (geoid, name, geometry) VALUES (?1, ?2, ?3)"
            ))?;
            for shape in rows {
                stmt.execute(params![shape.geoid, shape.name, shape.geometry])?;
            }
        }
        tx.commit()?;
        debug!(rows = rows.len(), table = SHAPE_TABLE, "inserted batch");
        Ok(())
    }
}
