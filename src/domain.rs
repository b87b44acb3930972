use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

pub const YEARLY_TABLE: &str = "dp03table";
pub const SHAPE_TABLE: &str = "geotable";

pub const INCOME_FIELDS: [(&str, &str); 11] = [
    ("DP03_0051E", "total_house"),
    ("DP03_0052E", "inc_less_10k"),
    ("DP03_0053E", "inc_10k_15k"),
    ("DP03_0054E", "inc_15_25k"),
    ("DP03_0055E", "inc_25k_35k"),
    ("DP03_0056E", "inc_35k_50k"),
    ("DP03_0057E", "inc_50k_75k"),
    ("DP03_0058E", "inc_75k_100k"),
    ("DP03_0059E", "inc_100k_150k"),
    ("DP03_0060E", "inc_150k_200k"),
    ("DP03_0061E", "inc_more_200k"),
];

pub const STATE_COLUMN: &str = "state";
pub const COUNTY_COLUMN: &str = "county";
pub const SUBDIVISION_COLUMN: &str = "county subdivision";

static GEOID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());

pub fn income_field_codes() -> Vec<&'static str> {
    INCOME_FIELDS.iter().map(|(code, _)| *code).collect()
}

pub fn income_column_names() -> Vec<&'static str> {
    INCOME_FIELDS.iter().map(|(_, column)| *column).collect()
}

/// County-subdivision identifier: state (2) + county (3) + subdivision (5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geoid(String);

impl Geoid {
    pub fn from_parts(state: &str, county: &str, subdivision: &str) -> Result<Self, SyncError> {
        let parts = [
            (STATE_COLUMN, state, 2),
            (COUNTY_COLUMN, county, 3),
            (SUBDIVISION_COLUMN, subdivision, 5),
        ];
        for (column, value, width) in parts {
            if value.len() != width {
                return Err(SyncError::SchemaMismatch(format!(
                    "{column} code {value:?} is not {width} characters wide"
                )));
            }
        }
        format!("{state}{county}{subdivision}").parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Geoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Geoid {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !GEOID_RE.is_match(value) {
            return Err(SyncError::SchemaMismatch(format!("invalid geoid: {value:?}")));
        }
        Ok(Self(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRecord {
    pub geoid: Geoid,
    pub year: i64,
    pub total_house: i64,
    pub inc_less_10k: i64,
    pub inc_10k_15k: i64,
    pub inc_15_25k: i64,
    pub inc_25k_35k: i64,
    pub inc_35k_50k: i64,
    pub inc_50k_75k: i64,
    pub inc_75k_100k: i64,
    pub inc_100k_150k: i64,
    pub inc_150k_200k: i64,
    pub inc_more_200k: i64,
}

impl YearlyRecord {
    pub fn from_counts(geoid: Geoid, year: i64, counts: [i64; 11]) -> Self {
        let [
            total_house,
            inc_less_10k,
            inc_10k_15k,
            inc_15_25k,
            inc_25k_35k,
            inc_35k_50k,
            inc_50k_75k,
            inc_75k_100k,
            inc_100k_150k,
            inc_150k_200k,
            inc_more_200k,
        ] = counts;
        Self {
            geoid,
            year,
            total_house,
            inc_less_10k,
            inc_10k_15k,
            inc_15_25k,
            inc_25k_35k,
            inc_35k_50k,
            inc_50k_75k,
            inc_75k_100k,
            inc_100k_150k,
            inc_150k_200k,
            inc_more_200k,
        }
    }

    pub fn counts(&self) -> [i64; 11] {
        [
            self.total_house,
            self.inc_less_10k,
            self.inc_10k_15k,
            self.inc_15_25k,
            self.inc_25k_35k,
            self.inc_35k_50k,
            self.inc_50k_75k,
            self.inc_75k_100k,
            self.inc_100k_150k,
            self.inc_150k_200k,
            self.inc_more_200k,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoShape {
    pub geoid: String,
    pub name: String,
    pub geometry: String,
}
