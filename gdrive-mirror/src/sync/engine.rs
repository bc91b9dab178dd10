use std::io;
use std::path::{Path, PathBuf};

use gdrive_core::{DriveError, DriveFile};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::calendar::{Cursor, Rollover, SyncBoundary, local_path, month_dir, year_dir};
use super::materializer::{FileMaterializer, Materialized, TransferError};
use super::matcher::NamePattern;
use super::resolver::{DirectoryResolver, RemoteContainer};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] DriveError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
    #[error("failed to create {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The walk finished the last day of the previous calendar year.
    BoundaryReached,
    /// The cursor day is already on disk; everything older is assumed synced.
    LocalAlreadyPresent,
    LookupFailed,
}

#[derive(Debug)]
enum TraversalState {
    AtYear,
    AtMonth {
        year: RemoteContainer,
    },
    AtDay {
        year: RemoteContainer,
        month: RemoteContainer,
    },
    Stopped(StopReason),
}

/// Where the walk goes after a day has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Day,
    Month,
    Year,
    Boundary,
}

pub fn next_step(
    rollover: Option<Rollover>,
    cursor: &Cursor,
    boundary: &SyncBoundary,
) -> NextStep {
    match rollover {
        None => NextStep::Boundary,
        Some(_) if !boundary.admits(cursor) => NextStep::Boundary,
        Some(Rollover::SameMonth) => NextStep::Day,
        Some(Rollover::NewMonth) => NextStep::Month,
        Some(Rollover::NewYear) => NextStep::Year,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAction<'a> {
    Stop,
    Skip,
    Download(&'a str),
}

pub fn plan_day(local_present: bool, matched: Option<&DriveFile>) -> DayAction<'_> {
    if local_present {
        return DayAction::Stop;
    }
    match matched {
        Some(entry) => DayAction::Download(&entry.id),
        None => DayAction::Skip,
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub reason: StopReason,
    /// Last day the walk visited.
    pub cursor: Cursor,
    pub downloaded: Vec<PathBuf>,
    /// Zero-byte files left for non-OK downloads under the lenient policy.
    pub empty_files: Vec<PathBuf>,
    pub missing_days: usize,
    pub year_resolutions: usize,
    pub month_resolutions: usize,
    pub failure: Option<EngineError>,
}

impl SyncReport {
    fn new(start: Cursor) -> Self {
        Self {
            reason: StopReason::BoundaryReached,
            cursor: start,
            downloaded: Vec::new(),
            empty_files: Vec::new(),
            missing_days: 0,
            year_resolutions: 0,
            month_resolutions: 0,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(mut self) -> Result<Self, EngineError> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

pub struct SyncEngine<R, M> {
    resolver: R,
    materializer: M,
    local_root: PathBuf,
    root_folder_id: String,
}

impl<R, M> SyncEngine<R, M>
where
    R: DirectoryResolver,
    M: FileMaterializer,
{
    pub fn new(
        resolver: R,
        materializer: M,
        local_root: PathBuf,
        root_folder_id: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            materializer,
            local_root,
            root_folder_id: root_folder_id.into(),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn materializer(&self) -> &M {
        &self.materializer
    }

    /// Walks backward from `start` until a stop condition is hit.
    pub async fn run_from(&self, start: Cursor) -> SyncReport {
        let boundary = SyncBoundary::for_start(start);
        let mut cursor = start;
        let mut report = SyncReport::new(start);
        info!(
            start = %start,
            boundary = boundary.year(),
            root = %self.local_root.display(),
            "starting archive sync"
        );

        let root = match self.resolver.list_children(&self.root_folder_id).await {
            Ok(root) => root,
            Err(err) => {
                report.failure = Some(err.into());
                return self.finish(report, cursor, StopReason::LookupFailed);
            }
        };

        let mut state = TraversalState::AtYear;
        loop {
            let step = match state {
                TraversalState::Stopped(reason) => return self.finish(report, cursor, reason),
                TraversalState::AtYear => self.enter_year(&root, &cursor, &mut report).await,
                TraversalState::AtMonth { year } => {
                    self.enter_month(year, &cursor, &mut report).await
                }
                TraversalState::AtDay { year, month } => {
                    self.sync_day(year, month, &mut cursor, &boundary, &mut report)
                        .await
                }
            };
            state = match step {
                Ok(next) => next,
                Err(err) => {
                    report.failure = Some(err);
                    TraversalState::Stopped(StopReason::LookupFailed)
                }
            };
        }
    }

    async fn enter_year(
        &self,
        root: &RemoteContainer,
        cursor: &Cursor,
        report: &mut SyncReport,
    ) -> Result<TraversalState, EngineError> {
        let year = cursor.year();
        let folder_id = match root.find(&NamePattern::year(year)?) {
            Some(entry) => entry.id.as_str(),
            None => {
                warn!(year, "no remote folder for year, treating it as empty");
                ""
            }
        };
        debug!(year, folder_id, "resolving year folder");
        report.year_resolutions += 1;
        let container = self.resolver.list_children(folder_id).await?;

        create_dir(&year_dir(&self.local_root, year)).await?;
        create_dir(&year_dir(&self.local_root, year - 1)).await?;
        Ok(TraversalState::AtMonth { year: container })
    }

    async fn enter_month(
        &self,
        year: RemoteContainer,
        cursor: &Cursor,
        report: &mut SyncReport,
    ) -> Result<TraversalState, EngineError> {
        let code = cursor.month_code();
        let folder_id = match year.find(&NamePattern::month(cursor.month())?) {
            Some(entry) => entry.id.as_str(),
            None => {
                warn!(
                    year = cursor.year(),
                    month = code,
                    "no remote folder for month, treating it as empty"
                );
                ""
            }
        };
        debug!(year = cursor.year(), month = code, folder_id, "resolving month folder");
        report.month_resolutions += 1;
        let month = self.resolver.list_children(folder_id).await?;

        create_dir(&month_dir(&self.local_root, cursor.year(), cursor.month())).await?;
        Ok(TraversalState::AtDay { year, month })
    }

    async fn sync_day(
        &self,
        year: RemoteContainer,
        month: RemoteContainer,
        cursor: &mut Cursor,
        boundary: &SyncBoundary,
        report: &mut SyncReport,
    ) -> Result<TraversalState, EngineError> {
        let target = local_path(&self.local_root, cursor);
        let present = tokio::fs::try_exists(&target).await?;
        let pattern = NamePattern::day(cursor.day())?;

        match plan_day(present, month.find(&pattern)) {
            DayAction::Stop => {
                info!(day = %cursor, path = %target.display(), "archive already present locally");
                return Ok(TraversalState::Stopped(StopReason::LocalAlreadyPresent));
            }
            DayAction::Skip => {
                info!(day = %cursor, "no remote archive for day");
                self.materializer.materialize(&target, "").await?;
                report.missing_days += 1;
            }
            DayAction::Download(file_id) => {
                match self.materializer.materialize(&target, file_id).await? {
                    Materialized::Written { bytes } => {
                        info!(day = %cursor, bytes, path = %target.display(), "archive downloaded");
                        report.downloaded.push(target);
                    }
                    Materialized::Empty { status } => {
                        warn!(day = %cursor, %status, path = %target.display(), "archive left empty");
                        report.empty_files.push(target);
                    }
                    // Materializer declined a resolved id; same as no remote archive.
                    Materialized::Skipped => {
                        warn!(day = %cursor, file_id, "archive not fetched");
                        report.missing_days += 1;
                    }
                }
            }
        }

        let visited = *cursor;
        let rollover = cursor.step_back();
        Ok(match next_step(rollover, cursor, boundary) {
            NextStep::Day => TraversalState::AtDay { year, month },
            NextStep::Month => TraversalState::AtMonth { year },
            NextStep::Year => TraversalState::AtYear,
            NextStep::Boundary => {
                *cursor = visited;
                TraversalState::Stopped(StopReason::BoundaryReached)
            }
        })
    }

    fn finish(&self, mut report: SyncReport, cursor: Cursor, reason: StopReason) -> SyncReport {
        report.reason = reason;
        report.cursor = cursor;
        match &report.failure {
            Some(err) => warn!(day = %cursor, "archive sync failed: {err}"),
            None => info!(
                day = %cursor,
                ?reason,
                downloaded = report.downloaded.len(),
                empty = report.empty_files.len(),
                missing = report.missing_days,
                "archive sync finished"
            ),
        }
        report
    }
}

async fn create_dir(path: &Path) -> Result<(), EngineError> {
    info!(path = %path.display(), "creating directory");
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| EngineError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
