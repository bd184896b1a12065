//! High-level library API: select scenes, plan the work list for the
//! configured workflows, and run it through a processing engine. Prefer these
//! entry points over the planning modules when embedding SARPLAN.
use tracing::{info, warn};

use crate::core::params::PlannerConfig;
use crate::core::planning::grouping::partition;
use crate::core::planning::ledger::OutputLedger;
use crate::core::planning::recovery::rescue_runs;
use crate::core::planning::requests::{Plan, Planner, validate_params};
use crate::error::{Error, ErrorKind, Result};
use crate::io::aoi::Aoi;
use crate::io::catalog::{ArchiveCatalog, SceneCatalog, SceneQuery};
use crate::io::engine::{DryRunEngine, GptEngine, ProcessingEngine};
use crate::io::failures::{FailureLog, FailureRecord};
use crate::io::safe::{AnnotationSource, SafeArchive};
use crate::types::Acquisition;

/// What happened to one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Engine ran and reported success
    Completed,
    /// Output already present; never handed to the engine
    AlreadyComplete,
    /// AOI does not touch the unit's bursts
    NoOverlap,
    /// Rejected while planning
    Invalid,
    /// Engine reported failure; recorded in the failure log
    EngineFailed,
}

impl UnitOutcome {
    pub fn from_error(error: &Error) -> Self {
        match error.kind() {
            ErrorKind::NoOverlap => UnitOutcome::NoOverlap,
            ErrorKind::EngineFailure => UnitOutcome::EngineFailed,
            ErrorKind::InvalidInput | ErrorKind::Io => UnitOutcome::Invalid,
        }
    }
}

/// Batch processing report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub no_overlap: usize,
    pub invalid: usize,
    pub errors: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Completed => self.processed += 1,
            UnitOutcome::AlreadyComplete => self.skipped += 1,
            UnitOutcome::NoOverlap => self.no_overlap += 1,
            UnitOutcome::Invalid => self.invalid += 1,
            UnitOutcome::EngineFailed => self.errors += 1,
        }
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.no_overlap += other.no_overlap;
        self.invalid += other.invalid;
        self.errors += other.errors;
    }
}

/// Load the configured AOI, if any.
pub fn load_aoi(config: &PlannerConfig) -> Result<Option<Aoi>> {
    config
        .aoi
        .as_deref()
        .map(Aoi::from_geojson_file)
        .transpose()
}

/// Scan the data directory and apply the configured date/mode window.
pub fn select_scenes(config: &PlannerConfig) -> Result<Vec<Acquisition>> {
    let data_dir = config.data_dir.as_deref().ok_or_else(|| Error::MissingArgument {
        arg: "data_dir".to_string(),
    })?;
    let query = SceneQuery::from_bounds(
        config.min_date.as_deref(),
        config.max_date.as_deref(),
        Some(config.mode),
    )?;
    ArchiveCatalog::scan(data_dir)?.select(&query)
}

/// Plan the configured workflows over a scene snapshot.
pub fn plan_scenes<A>(
    scenes: Vec<Acquisition>,
    config: &PlannerConfig,
    aoi: Option<&Aoi>,
    annotations: &A,
) -> Result<Plan>
where
    A: AnnotationSource + ?Sized,
{
    validate_params(&config.params, &config.workflows)?;
    let tracks = partition(scenes);
    info!("{} track(s) to plan", tracks.len());
    let planner = Planner::new(&config.params, aoi, annotations);
    Ok(planner.plan(&tracks, &config.workflows, |workflow| {
        OutputLedger::new(config.out_dir(workflow))
    }))
}

/// Hand every request to the engine. Failures are logged and counted; the
/// batch continues with the next request.
pub fn execute_plan<E>(plan: &Plan, engine: &E, failures: &FailureLog) -> BatchReport
where
    E: ProcessingEngine + ?Sized,
{
    let mut report = BatchReport::default();
    report.skipped += plan.skipped.len();
    for rejection in &plan.rejected {
        report.record(UnitOutcome::from_error(&rejection.error));
    }

    for request in &plan.requests {
        match engine.execute(request) {
            Ok(()) => report.record(UnitOutcome::Completed),
            Err(e) => {
                warn!("{} failed: {}", request.unit_name(), e);
                if let Err(log_err) = failures.append(&FailureRecord::from_request(request, &e)) {
                    warn!("Cannot record failure in {}: {}", failures.path().display(), log_err);
                }
                report.record(UnitOutcome::from_error(&e));
            }
        }
    }
    report
}

fn engine_for(config: &PlannerConfig) -> Box<dyn ProcessingEngine> {
    if config.engine.dry_run {
        Box::new(DryRunEngine::new(&config.tmp_dir))
    } else {
        Box::new(GptEngine::new(&config.engine, &config.tmp_dir))
    }
}

/// Full run: scan, plan and execute. With `retry_failed`, only the rescue
/// runs around the dates in the failure log are re-planned, one at a time;
/// outputs that exist inside a run are skipped by the ledger.
pub fn run(config: &PlannerConfig, retry_failed: bool) -> Result<BatchReport> {
    let aoi = load_aoi(config)?;
    let scenes = select_scenes(config)?;
    let engine = engine_for(config);
    let failures = FailureLog::in_dir(&config.failure_log_dir);

    let batches: Vec<Vec<Acquisition>> = if retry_failed {
        let dates = failures.failed_dates(None)?;
        let runs = rescue_runs(&dates, &scenes, config.max_gap_days);
        info!("Retrying {} failed date(s) in {} run(s)", dates.len(), runs.len());
        runs
    } else {
        vec![scenes]
    };

    let mut report = BatchReport::default();
    for batch in batches {
        let plan = plan_scenes(batch, config, aoi.as_ref(), &SafeArchive)?;
        report.merge(execute_plan(&plan, engine.as_ref(), &failures));
    }
    info!(
        "processed={} skipped={} no_overlap={} invalid={} errors={}",
        report.processed, report.skipped, report.no_overlap, report.invalid, report.errors
    );
    Ok(report)
}

/// Plan only and return the work list, without touching the engine.
pub fn plan_directory(config: &PlannerConfig) -> Result<Plan> {
    let aoi = load_aoi(config)?;
    let scenes = select_scenes(config)?;
    plan_scenes(scenes, config, aoi.as_ref(), &SafeArchive)
}
