use std::collections::HashMap;

use crate::census::RawTable;
use crate::domain::{
    COUNTY_COLUMN, Geoid, INCOME_FIELDS, STATE_COLUMN, SUBDIVISION_COLUMN, YearlyRecord,
};
use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl WideTable {
    fn column_index(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), index))
            .collect()
    }
}

pub fn pivot(raw: &RawTable) -> WideTable {
    WideTable {
        columns: raw.header.iter().map(|name| name.to_lowercase()).collect(),
        rows: raw.rows.clone(),
    }
}

pub fn reshape(raw: &RawTable, year: i32) -> Result<Vec<YearlyRecord>, SyncError> {
    let wide = pivot(raw);
    let index = wide.column_index();

    let income_codes: Vec<String> = INCOME_FIELDS
        .iter()
        .map(|(code, _)| code.to_lowercase())
        .collect();
    for column in &wide.columns {
        let known = [STATE_COLUMN, COUNTY_COLUMN, SUBDIVISION_COLUMN].contains(&column.as_str())
            || income_codes.contains(column);
        if !known {
            return Err(SyncError::SchemaMismatch(format!(
                "unexpected column {column:?}"
            )));
        }
    }
    if index.len() != wide.columns.len() {
        return Err(SyncError::SchemaMismatch(
            "duplicate column in header".to_string(),
        ));
    }

    let lookup = |name: &str| {
        index
            .get(name)
            .copied()
            .ok_or_else(|| SyncError::SchemaMismatch(format!("missing column {name:?}")))
    };
    let state = lookup(STATE_COLUMN)?;
    let county = lookup(COUNTY_COLUMN)?;
    let subdivision = lookup(SUBDIVISION_COLUMN)?;
    let count_columns = income_codes
        .iter()
        .zip(INCOME_FIELDS.iter())
        .map(|(code, (_, column))| Ok((lookup(code.as_str())?, *column)))
        .collect::<Result<Vec<_>, SyncError>>()?;

    wide.rows
        .iter()
        .enumerate()
        .map(|(index, row)| -> Result<YearlyRecord, SyncError> {
            if row.len() != wide.columns.len() {
                return Err(SyncError::SchemaMismatch(format!(
                    "row {} has {} cells, header has {}",
                    index + 1,
                    row.len(),
                    wide.columns.len()
                )));
            }
            let geoid = Geoid::from_parts(
                geo_code(row, state, STATE_COLUMN)?,
                geo_code(row, county, COUNTY_COLUMN)?,
                geo_code(row, subdivision, SUBDIVISION_COLUMN)?,
            )?;
            let mut counts = [0i64; 11];
            for (slot, (position, column)) in counts.iter_mut().zip(&count_columns) {
                *slot = parse_count(row[*position].as_deref(), column)?;
            }
            Ok(YearlyRecord::from_counts(geoid, i64::from(year), counts))
        })
        .collect()
}

fn geo_code<'a>(
    row: &'a [Option<String>],
    position: usize,
    column: &str,
) -> Result<&'a str, SyncError> {
    row[position]
        .as_deref()
        .ok_or_else(|| SyncError::SchemaMismatch(format!("{column} code is null")))
}

pub fn parse_count(value: Option<&str>, column: &str) -> Result<i64, SyncError> {
    let text = value.ok_or_else(|| SyncError::InvalidCount {
        column: column.to_string(),
        value: "null".to_string(),
    })?;
    text.parse::<i64>().map_err(|_| SyncError::InvalidCount {
        column: column.to_string(),
        value: text.to_string(),
    })
}
