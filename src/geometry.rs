use shapefile::{Point, PolygonRing, Shape};

use crate::error::SyncError;

/// Renders a shapefile polygon as WKT. Each outer ring opens a new part and
/// takes the inner rings that follow it; several parts make a MULTIPOLYGON.
pub fn shape_to_wkt(shape: &Shape) -> Result<String, SyncError> {
    match shape {
        Shape::Polygon(polygon) => rings_to_wkt(polygon.rings()),
        other => Err(SyncError::Geometry(format!(
            "expected Polygon, found {:?}",
            other.shapetype()
        ))),
    }
}

pub fn rings_to_wkt(rings: &[PolygonRing<Point>]) -> Result<String, SyncError> {
    let mut parts: Vec<Vec<&[Point]>> = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => parts.push(vec![points.as_slice()]),
            PolygonRing::Inner(points) => match parts.last_mut() {
                Some(part) => part.push(points.as_slice()),
                None => {
                    return Err(SyncError::Geometry(
                        "inner ring before any outer ring".to_string(),
                    ));
                }
            },
        }
    }

    match parts.as_slice() {
        [] => Err(SyncError::Geometry("polygon has no rings".to_string())),
        [single] => Ok(format!("POLYGON({})", part_text(single))),
        many => {
            let body = many
                .iter()
                .map(|part| format!("({})", part_text(part)))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!("MULTIPOLYGON({body})"))
        }
    }
}

fn part_text(rings: &[&[Point]]) -> String {
    rings
        .iter()
        .map(|points| {
            let coords = points
                .iter()
                .map(|point| format!("{} {}", point.x, point.y))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({coords})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
