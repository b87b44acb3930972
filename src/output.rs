use std::io::{self, Write};

use serde::Serialize;

use crate::sync::{ShapeLoad, YearState, YearlySync};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income: Option<IncomeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapes: Option<ShapeReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncomeReport {
    #[serde(flatten)]
    pub sync: YearlySync,
    pub total_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeReport {
    #[serde(flatten)]
    pub load: ShapeLoad,
    pub total_rows: usize,
}

impl From<YearlySync> for IncomeReport {
    fn from(sync: YearlySync) -> Self {
        let total_rows = sync.table.len();
        Self { sync, total_rows }
    }
}

impl From<ShapeLoad> for ShapeReport {
    fn from(load: ShapeLoad) -> Self {
        let total_rows = load.table.len();
        Self { load, total_rows }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(Self::render(report).as_bytes())
    }

    pub fn render(report: &RunReport) -> String {
        let mut out = String::new();
        if let Some(income) = &report.income {
            out.push_str("income brackets:\n");
            for status in &income.sync.years {
                let state = match status.state {
                    YearState::Present => "present",
                    YearState::Inserted => "inserted",
                    YearState::Unavailable => "unavailable",
                };
                out.push_str(&format!("  {}  {:<11} {} rows\n", status.year, state, status.rows));
            }
            out.push_str(&format!("  total: {} rows\n", income.total_rows));
        }
        if let Some(shapes) = &report.shapes {
            out.push_str("county subdivisions:\n");
            if shapes.load.downloaded {
                out.push_str("  archive downloaded\n");
            }
            out.push_str(&format!(
                "  inserted: {}, total: {} rows\n",
                shapes.load.inserted, shapes.total_rows
            ));
        }
        out
    }
}
