use std::ops::Range;

use chrono::{Datelike, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::census::CensusClient;
use crate::config::SyncConfig;
use crate::domain::{GeoShape, SHAPE_TABLE, YEARLY_TABLE, YearlyRecord, income_field_codes};
use crate::download::FileDownloader;
use crate::error::SyncError;
use crate::fs_util::validate_zip;
use crate::layout::DataLayout;
use crate::shapes::read_shapes;
use crate::store::TableStore;
use crate::transform::reshape;

#[derive(Debug)]
pub enum YearOutcome {
    Present { rows: usize },
    Inserted { rows: usize },
    Unavailable,
    Fatal(SyncError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YearState {
    Present,
    Inserted,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearStatus {
    pub year: i32,
    pub state: YearState,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlySync {
    pub years: Vec<YearStatus>,
    #[serde(skip)]
    pub table: Vec<YearlyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShapeLoad {
    pub downloaded: bool,
    pub inserted: usize,
    #[serde(skip)]
    pub table: Vec<GeoShape>,
}

pub struct Coordinator<C: CensusClient, D: FileDownloader, S: TableStore> {
    config: SyncConfig,
    layout: DataLayout,
    census: C,
    downloader: D,
    store: S,
}

impl<C: CensusClient, D: FileDownloader, S: TableStore> Coordinator<C, D, S> {
    pub fn new(config: SyncConfig, census: C, downloader: D, store: S) -> Result<Self, SyncError> {
        let layout = DataLayout::new(config.data_dir.clone());
        layout.ensure()?;
        Ok(Self {
            config,
            layout,
            census,
            downloader,
            store,
        })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn census(&self) -> &C {
        &self.census
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn year_range(&self) -> Range<i32> {
        let end = self
            .config
            .last_year_exclusive
            .unwrap_or_else(|| Local::now().year());
        self.config.first_year..end
    }

    pub fn synchronize(&mut self) -> Result<YearlySync, SyncError> {
        let mut years = Vec::new();
        for year in self.year_range() {
            let (state, rows) = match self.evaluate_year(year) {
                YearOutcome::Present { rows } => (YearState::Present, rows),
                YearOutcome::Inserted { rows } => (YearState::Inserted, rows),
                YearOutcome::Unavailable => (YearState::Unavailable, 0),
                YearOutcome::Fatal(err) => return Err(err),
            };
            years.push(YearStatus { year, state, rows });
        }
        let table = self.store.yearly_table()?;
        info!(rows = table.len(), table = YEARLY_TABLE, "income table synchronized");
        Ok(YearlySync { years, table })
    }

    pub fn evaluate_year(&mut self, year: i32) -> YearOutcome {
        let existing = match self.store.yearly_rows(i64::from(year)) {
            Ok(rows) => rows,
            Err(err) => return YearOutcome::Fatal(err),
        };
        if !existing.is_empty() {
            info!(year, "data for year is in the database");
            return YearOutcome::Present {
                rows: existing.len(),
            };
        }

        info!(year, "pulling data");
        let fields = income_field_codes();
        let rows = match self
            .census
            .fetch(&fields, year)
            .and_then(|raw| reshape(&raw, year))
        {
            Ok(rows) => rows,
            Err(SyncError::DataUnavailable { .. }) => {
                warn!(year, "the ACS for year is not available");
                return YearOutcome::Unavailable;
            }
            Err(err) => return YearOutcome::Fatal(err),
        };

        if let Err(err) = self.store.insert_yearly(&rows) {
            return YearOutcome::Fatal(err);
        }
        info!(year, rows = rows.len(), "successfully inserted year");
        YearOutcome::Inserted { rows: rows.len() }
    }

    pub fn load_shapes_if_empty(&mut self) -> Result<ShapeLoad, SyncError> {
        let archive = self.layout.shape_archive_path();
        let downloaded = if archive.as_std_path().exists() {
            false
        } else {
            self.downloader
                .download(&self.config.shape_url, archive.as_std_path())?;
            if let Err(err) = validate_zip(archive.as_std_path()) {
                if let Err(remove_err) = std::fs::remove_file(archive.as_std_path()) {
                    warn!(%archive, error = %remove_err, "could not remove corrupt archive");
                }
                return Err(err);
            }
            true
        };

        let existing = self.store.shape_table()?;
        if !existing.is_empty() {
            info!(rows = existing.len(), table = SHAPE_TABLE, "shape table already loaded");
            return Ok(ShapeLoad {
                downloaded,
                inserted: 0,
                table: existing,
            });
        }

        info!(%archive, table = SHAPE_TABLE, "shape table is empty, inserting archive");
        let shapes = read_shapes(archive.as_std_path())?;
        self.store.insert_shapes(&shapes)?;
        info!(rows = shapes.len(), table = SHAPE_TABLE, "successfully inserted shapes");

        Ok(ShapeLoad {
            downloaded,
            inserted: shapes.len(),
            table: self.store.shape_table()?,
        })
    }
}
