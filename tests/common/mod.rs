#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8PathBuf;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};

use census_sync::census::{CensusClient, RawTable, parse_table};
use census_sync::config::SyncConfig;
use census_sync::domain::{GeoShape, YearlyRecord, income_field_codes};
use census_sync::download::FileDownloader;
use census_sync::error::SyncError;
use census_sync::store::{ConnectionDescriptor, SqliteStore, TableStore};

pub fn config(data_dir: &Path, first_year: i32, last_year_exclusive: i32) -> SyncConfig {
    SyncConfig {
        store: ConnectionDescriptor::Sqlite { path: None },
        data_dir: Utf8PathBuf::from_path_buf(data_dir.to_path_buf()).unwrap(),
        first_year,
        last_year_exclusive: Some(last_year_exclusive),
        state_fips: "72".to_string(),
        census_base_url: "http://census.invalid/data".to_string(),
        shape_url: "http://census.invalid/cousub.zip".to_string(),
        verify_tls: true,
        timeout: Duration::from_secs(1),
    }
}

/// Response body for one year: two subdivisions, counts offset by the year.
pub fn profile_body(year: i32) -> String {
    let mut header: Vec<String> = income_field_codes()
        .into_iter()
        .map(|code| format!("\"{code}\""))
        .collect();
    header.extend(["\"state\"", "\"county\"", "\"county subdivision\""].map(String::from));

    let row = |base: i32, county: &str, cousub: &str| {
        let mut cells: Vec<String> = (0..11).map(|i| format!("\"{}\"", base + i)).collect();
        cells.extend([
            "\"72\"".to_string(),
            format!("\"{county}\""),
            format!("\"{cousub}\""),
        ]);
        format!("[{}]", cells.join(","))
    };

    format!(
        "[[{}],{},{}]",
        header.join(","),
        row(year, "001", "01387"),
        row(year * 10, "003", "01899")
    )
}

#[derive(Default)]
pub struct MockCensus {
    pub bodies: BTreeMap<i32, String>,
    pub calls: Mutex<Vec<i32>>,
}

impl MockCensus {
    pub fn with_years(years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            bodies: years.into_iter().map(|year| (year, profile_body(year))).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_body(mut self, year: i32, body: &str) -> Self {
        self.bodies.insert(year, body.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<i32> {
        self.calls.lock().unwrap().clone()
    }
}

impl CensusClient for MockCensus {
    fn fetch(&self, fields: &[&str], year: i32) -> Result<RawTable, SyncError> {
        assert_eq!(fields, income_field_codes().as_slice());
        self.calls.lock().unwrap().push(year);
        let body = self
            .bodies
            .get(&year)
            .map(String::as_str)
            .unwrap_or("<html><body>error: unknown/unsupported geography hierarchy</body></html>");
        parse_table(body, year)
    }
}

/// Copies a prepared archive instead of hitting the network.
pub struct MockDownloader {
    pub source: PathBuf,
    pub calls: Mutex<usize>,
}

impl MockDownloader {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            calls: Mutex::new(0),
        }
    }

    pub fn count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl FileDownloader for MockDownloader {
    fn download(&self, _url: &str, destination: &Path) -> Result<(), SyncError> {
        *self.calls.lock().unwrap() += 1;
        std::fs::copy(&self.source, destination)
            .map_err(|err| SyncError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

/// In-memory SQLite store that records how it was used.
pub struct CountingStore {
    pub inner: SqliteStore,
    pub year_queries: Vec<i64>,
    pub yearly_inserts: Vec<usize>,
    pub shape_inserts: usize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            year_queries: Vec::new(),
            yearly_inserts: Vec::new(),
            shape_inserts: 0,
        }
    }
}

impl TableStore for CountingStore {
    fn yearly_rows(&mut self, year: i64) -> Result<Vec<YearlyRecord>, SyncError> {
        self.year_queries.push(year);
        self.inner.yearly_rows(year)
    }

    fn yearly_table(&mut self) -> Result<Vec<YearlyRecord>, SyncError> {
        self.inner.yearly_table()
    }

    fn insert_yearly(&mut self, rows: &[YearlyRecord]) -> Result<(), SyncError> {
        self.yearly_inserts.push(rows.len());
        self.inner.insert_yearly(rows)
    }

    fn shape_table(&mut self) -> Result<Vec<GeoShape>, SyncError> {
        self.inner.shape_table()
    }

    fn insert_shapes(&mut self, rows: &[GeoShape]) -> Result<(), SyncError> {
        self.shape_inserts += 1;
        self.inner.insert_shapes(rows)
    }
}

fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x, y + size),
        Point::new(x + size, y + size),
        Point::new(x + size, y),
        Point::new(x, y),
    ]
}

/// Writes a two-feature county-subdivision shapefile and zips it at
/// `dir/name`.
pub fn write_shape_archive(dir: &Path, name: &str) -> PathBuf {
    let shp_path = dir.join("tl_2024_72_cousub.shp");
    let builder = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("GEOID").unwrap(), 10)
        .add_character_field(FieldName::try_from("NAME").unwrap(), 100);
    {
        let mut writer = shapefile::Writer::from_path(&shp_path, builder).unwrap();
        let features = [
            ("7200101387", "Adjuntas barrio-pueblo", square(-66.8, 18.1, 0.5)),
            ("7200301899", "Aguada barrio-pueblo", square(-67.2, 18.3, 0.25)),
        ];
        for (geoid, name, ring) in features {
            let polygon = Polygon::new(PolygonRing::Outer(ring));
            let mut record = Record::default();
            record.insert(
                "GEOID".to_string(),
                FieldValue::Character(Some(geoid.to_string())),
            );
            record.insert(
                "NAME".to_string(),
                FieldValue::Character(Some(name.to_string())),
            );
            writer.write_shape_and_record(&polygon, &record).unwrap();
        }
    }

    let archive = dir.join(name);
    let file = std::fs::File::create(&archive).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for ext in ["shp", "shx", "dbf"] {
        let member = shp_path.with_extension(ext);
        zip.start_file(
            member.file_name().unwrap().to_string_lossy().to_string(),
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        zip.write_all(&std::fs::read(&member).unwrap()).unwrap();
    }
    zip.finish().unwrap();
    archive
}
