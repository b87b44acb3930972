use std::io::Cursor;
use std::path::Path;

use shapefile::dbase::{FieldValue, Record};
use shapefile::{Reader, ShapeReader};
use tracing::debug;

use crate::domain::GeoShape;
use crate::error::SyncError;
use crate::fs_util::read_zip_member;
use crate::geometry::shape_to_wkt;

const GEOID_FIELD: &str = "GEOID";
const NAME_FIELD: &str = "NAME";

pub fn read_shapes(archive: &Path) -> Result<Vec<GeoShape>, SyncError> {
    let shp = read_zip_member(archive, "shp")?;
    let dbf = read_zip_member(archive, "dbf")?;

    let shape_reader =
        ShapeReader::new(Cursor::new(shp)).map_err(|err| SyncError::Archive(err.to_string()))?;
    let dbase_reader = shapefile::dbase::Reader::new(Cursor::new(dbf))
        .map_err(|err| SyncError::Archive(err.to_string()))?;
    let mut reader = Reader::new(shape_reader, dbase_reader);

    let mut shapes = Vec::new();
    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item.map_err(|err| SyncError::Archive(err.to_string()))?;
        shapes.push(GeoShape {
            geoid: text_field(&record, GEOID_FIELD)?,
            name: text_field(&record, NAME_FIELD)?,
            geometry: shape_to_wkt(&shape)?,
        });
    }
    debug!(count = shapes.len(), archive = %archive.display(), "read shapes");
    Ok(shapes)
}

fn text_field(record: &Record, field: &str) -> Result<String, SyncError> {
    match record.get(field) {
        Some(FieldValue::Character(Some(value))) => Ok(value.trim().to_string()),
        Some(other) => Err(SyncError::Archive(format!(
            "field {field} is not text: {other:?}"
        ))),
        None => Err(SyncError::Archive(format!("missing field {field}"))),
    }
}
