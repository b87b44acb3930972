use postgres::types::ToSql;
use postgres::{Client, Config, NoTls, Row};
use tracing::debug;

use super::{
    ConnectionDescriptor, TableStore, placeholders, yearly_columns, yearly_table_definition,
};
use crate::domain::{GeoShape, SHAPE_TABLE, YEARLY_TABLE, YearlyRecord};
use crate::error::SyncError;

/// NAD83, the datum TIGER/Line shapefiles are published in.
const TIGER_SRID: i32 = 4269;

pub struct PostgisStore {
    client: Client,
}

impl PostgisStore {
    pub fn connect(descriptor: &ConnectionDescriptor) -> Result<Self, SyncError> {
        let ConnectionDescriptor::Postgres {
            user,
            password,
            host,
            port,
            database,
        } = descriptor
        else {
            return Err(SyncError::UnsupportedStore(descriptor.to_string()));
        };

        let mut config = Config::new();
        config.user(user).host(host).port(*port).dbname(database);
        if let Some(password) = password {
            config.password(password);
        }
        let client = config.connect(NoTls)?;
        let mut store = Self { client };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&mut self) -> Result<(), SyncError> {
        self.client.batch_execute(&format!(
            r#"
            CREATE EXTENSION IF NOT EXISTS postgis;
            CREATE TABLE IF NOT EXISTS {YEARLY_TABLE} ({yearly});
            CREATE TABLE IF NOT EXISTS {SHAPE_TABLE} (
              geoid TEXT NOT NULL,
              name TEXT NOT NULL,
              geometry geometry(Geometry, {TIGER_SRID}) NOT NULL
            );
            "#,
            yearly = yearly_table_definition("BIGINT"),
        ))?;
        Ok(())
    }

    fn select_yearly(
        &mut self,
        filter: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<YearlyRecord>, SyncError> {
        let sql = format!(
            "SELECT {} FROM {YEARLY_TABLE}{filter} ORDER BY year, geoid",
            yearly_columns()
        );
        self.client
            .query(&sql, params)?
            .iter()
            .map(read_yearly)
            .collect()
    }
}

fn read_yearly(row: &Row) -> Result<YearlyRecord, SyncError> {
    let geoid: String = row.try_get(0)?;
    let mut counts = [0i64; 11];
    for (offset, slot) in counts.iter_mut().enumerate() {
        *slot = row.try_get(offset + 2)?;
    }
    Ok(YearlyRecord::from_counts(
        geoid.parse()?,
        row.try_get(1)?,
        counts,
    ))
}

impl TableStore for PostgisStore {
    fn yearly_rows(&mut self, year: i64) -> Result<Vec<YearlyRecord>, SyncError> {
        self.select_yearly(" WHERE year = $1", &[&year])
    }

    fn yearly_table(&mut self) -> Result<Vec<YearlyRecord>, SyncError> {
        self.select_yearly("", &[])
    }

    fn insert_yearly(&mut self, rows: &[YearlyRecord]) -> Result<(), SyncError> {
        let sql = format!(
            "INSERT INTO {YEARLY_TABLE} ({}) VALUES ({})",
            yearly_columns(),
            placeholders('$', 13)
        );
        let mut tx = self.client.transaction()?;
        let stmt = tx.prepare(&sql)?;
        for row in rows {
            let geoid = row.geoid.as_str();
            let counts = row.counts();
            let mut params: Vec<&(dyn ToSql + Sync)> = vec![&geoid, &row.year];
            params.extend(counts.iter().map(|count| count as &(dyn ToSql + Sync)));
            tx.execute(&stmt, &params)?;
        }
        tx.commit()?;
        debug!(rows = rows.len(), table = YEARLY_TABLE, "inserted batch");
        Ok(())
    }

    fn shape_table(&mut self) -> Result<Vec<GeoShape>, SyncError> {
        let sql = format!(
            "SELECT geoid, name, ST_AsText(geometry) FROM {SHAPE_TABLE} ORDER BY geoid"
        );
        self.client
            .query(&sql, &[])?
            .iter()
            .map(|row| -> Result<GeoShape, SyncError> {
                Ok(GeoShape {
                    geoid: row.try_get(0)?,
                    name: row.try_get(1)?,
                    geometry: row.try_get(2)?,
                })
            })
            .collect()
    }

    fn insert_shapes(&mut self, rows: &[GeoShape]) -> Result<(), SyncError> {
        let sql = format!(
            "INSERT INTO {SHAPE_TABLE} (geoid, name, geometry) \
             VALUES ($1, $2, ST_GeomFromText($3, {TIGER_SRID}))"
        );
        let mut tx = self.client.transaction()?;
        let stmt = tx.prepare(&sql)?;
        for shape in rows {
            tx.execute(&stmt, &[&shape.geoid, &shape.name, &shape.geometry])?;
        }
        tx.commit()?;
        debug!(rows = rows.len(), table = SHAPE_TABLE, "inserted batch");
        Ok(())
    }
}
