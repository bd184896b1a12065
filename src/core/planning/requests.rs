//! Turns track partitions into engine requests.
//!
//! Per workflow and unit (a date, or a date pair for coherence) the planner
//! narrows sub-swaths and bursts to the AOI, selects polarizations, derives
//! one [`OutputMarker`] per leaf and keeps only the leaves the ledger reports
//! missing. Failures are attributed to the unit that caused them; siblings
//! keep planning.
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::params::{PolarizationSelection, ProcessingParams};
use crate::core::planning::bursts::resolve_date_bursts;
use crate::core::planning::graph::{
    OperationGraph, SwathSelection, coherence_graph, decomposition_graph, intensity_graph,
    swath_selection,
};
use crate::core::planning::grouping::{DateGroup, TrackPartition};
use crate::core::planning::ledger::{
    OutputLedger, OutputMarker, coh_product_name, ha_product_name, int_product_name,
};
use crate::core::planning::pairing::{ProcessingPair, pair_consecutive};
use crate::error::{Error, ErrorKind, Result};
use crate::io::aoi::Aoi;
use crate::io::safe::AnnotationSource;
use crate::types::{Acquisition, Polarization, SubSwath, Workflow};

/// One unit of engine work producing exactly one leaf output
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingRequest {
    pub workflow: Workflow,
    pub marker: OutputMarker,
    /// One entry per date, each ordered by start time
    pub scene_sets: Vec<Vec<PathBuf>>,
    pub dates: Vec<NaiveDate>,
    pub swaths: Vec<SwathSelection>,
    pub polarizations: Vec<Polarization>,
    /// Output path without extension; the engine appends it
    pub output: PathBuf,
    pub graph: OperationGraph,
}

impl ProcessingRequest {
    /// File-system safe unit name, unique within a plan
    pub fn unit_name(&self) -> String {
        let mut name = format!("{}_{}", self.marker.product, self.marker.leaf);
        if let Some(aoi) = &self.marker.aoi {
            name = format!("{aoi}_{name}");
        }
        name
    }

    pub fn scenes(&self) -> impl Iterator<Item = &PathBuf> {
        self.scene_sets.iter().flatten()
    }
}

/// A unit that was not planned
#[derive(Debug)]
pub struct Rejection {
    pub workflow: Workflow,
    /// Track, date or date pair the error belongs to
    pub unit: String,
    pub error: Error,
}

impl Rejection {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    pub requests: Vec<ProcessingRequest>,
    /// Leaves whose output already exists
    pub skipped: Vec<OutputMarker>,
    pub rejected: Vec<Rejection>,
}

impl Plan {
    pub fn extend(&mut self, other: Plan) {
        self.requests.extend(other.requests);
        self.skipped.extend(other.skipped);
        self.rejected.extend(other.rejected);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Sub-swath selections must be a single sub-swath or neighbouring ones.
pub fn validate_subswaths(subswaths: &[SubSwath]) -> Result<()> {
    let numbers: BTreeSet<u8> = subswaths.iter().map(SubSwath::number).collect();
    let (Some(first), Some(last)) = (numbers.first(), numbers.last()) else {
        return Err(Error::InvalidInput("no sub-swath selected".to_string()));
    };
    if usize::from(last - first) + 1 != numbers.len() {
        return Err(Error::InvalidInput(format!(
            "sub-swaths must be a single or consecutive IWs, got {}",
            subswaths
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join("+")
        )));
    }
    Ok(())
}

/// Checks that do not depend on any scene.
pub fn validate_params(params: &ProcessingParams, workflows: &[Workflow]) -> Result<()> {
    validate_subswaths(&params.subswaths)?;
    if params.external_dem && params.external_dem_file.is_none() {
        return Err(Error::MissingArgument {
            arg: "external_dem_file".to_string(),
        });
    }
    if workflows.contains(&Workflow::Ha) && params.decomposition_features.is_empty() {
        return Err(Error::InvalidInput(
            "at least one decomposition feature is required".to_string(),
        ));
    }
    Ok(())
}

/// Resolve a polarization selection against the channels a scene carries.
pub fn select_polarizations(
    selection: &PolarizationSelection,
    available: &[Polarization],
) -> Result<Vec<Polarization>> {
    let selected: Vec<Polarization> = match selection {
        PolarizationSelection::Full => available.to_vec(),
        PolarizationSelection::Single(pol) => {
            if !available.contains(pol) {
                return Err(Error::InvalidInput(format!(
                    "polarization {pol} does not exist in the source product"
                )));
            }
            vec![*pol]
        }
        PolarizationSelection::List(pols) => pols
            .iter()
            .filter(|p| available.contains(p))
            .copied()
            .collect(),
    };
    if selected.is_empty() {
        return Err(Error::InvalidInput(
            "none of the selected polarizations is available".to_string(),
        ));
    }
    Ok(selected)
}

fn scene_paths(group: &DateGroup) -> Vec<PathBuf> {
    group.scenes.iter().map(|s| s.path.clone()).collect()
}

/// Channels shared by every scene of the given dates, in first-scene order.
fn common_polarizations<'a, I>(scenes: I) -> Vec<Polarization>
where
    I: IntoIterator<Item = &'a Acquisition>,
{
    let mut iter = scenes.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut pols = first.polarizations.clone();
    for scene in iter {
        pols.retain(|p| scene.has_polarization(*p));
    }
    pols
}

/// Plans units of one or more tracks against per-workflow output ledgers
pub struct Planner<'a, A: AnnotationSource + ?Sized> {
    pub params: &'a ProcessingParams,
    pub aoi: Option<&'a Aoi>,
    pub annotations: &'a A,
}

impl<'a, A: AnnotationSource + ?Sized> Planner<'a, A> {
    pub fn new(params: &'a ProcessingParams, aoi: Option<&'a Aoi>, annotations: &'a A) -> Self {
        Self {
            params,
            aoi,
            annotations,
        }
    }

    fn aoi_name(&self) -> Option<&str> {
        self.aoi.map(|a| a.name.as_str())
    }

    fn extension(&self) -> &'static str {
        self.params.output_format.extension()
    }

    /// Date group with its AOI burst subset attached; unchanged without AOI.
    pub fn resolve_date(&self, group: &DateGroup) -> Result<DateGroup> {
        match self.aoi {
            Some(aoi) => {
                let subset = resolve_date_bursts(&group.scenes, aoi, self.annotations)?;
                debug!("{}: AOI sub-swaths {:?}", group.date, subset.subswaths());
                Ok(group.with_bursts(subset))
            }
            None => Ok(group.clone()),
        }
    }

    fn pending(
        &self,
        ledger: &OutputLedger,
        markers: Vec<OutputMarker>,
        plan: &mut Plan,
    ) -> Vec<OutputMarker> {
        let pending = ledger.pending(markers.iter().cloned());
        plan.skipped
            .extend(markers.into_iter().filter(|m| !pending.contains(m)));
        pending
    }

    fn output_path(ledger: &OutputLedger, marker: &OutputMarker) -> PathBuf {
        ledger
            .root()
            .join(marker.product_dir())
            .join(&marker.leaf)
    }

    /// Intensity: one request per missing polarization of each date.
    pub fn plan_intensity(&self, track: &TrackPartition, ledger: &OutputLedger) -> Plan {
        let mut plan = Plan::default();
        for group in &track.dates {
            let unit = format!("{}_{}", track.label(), group.date);
            if let Err(error) = self.intensity_unit(group, ledger, &mut plan) {
                reject(&mut plan, Workflow::Int, unit, error);
            }
        }
        plan
    }

    fn intensity_unit(&self, group: &DateGroup, ledger: &OutputLedger, plan: &mut Plan) -> Result<()> {
        let group = self.resolve_date(group)?;
        let pols = select_polarizations(&self.params.polarizations, &group.first().polarizations)?;
        let subswaths = group.subswaths(&self.params.subswaths);
        validate_subswaths(&subswaths)?;
        let swaths = swath_selection(&subswaths, group.bursts.as_ref());
        let product = int_product_name(&group);

        let markers = pols
            .iter()
            .map(|p| OutputMarker::new(product.clone(), p.as_str(), self.aoi_name(), self.extension()))
            .collect();
        for marker in self.pending(ledger, markers, plan) {
            let pol: Polarization = marker.leaf.parse()?;
            let output = Self::output_path(ledger, &marker);
            let scenes = scene_paths(&group);
            let graph = intensity_graph(&scenes, &swaths, pol, self.params, &output);
            plan.requests.push(ProcessingRequest {
                workflow: Workflow::Int,
                marker,
                scene_sets: vec![scenes],
                dates: vec![group.date],
                swaths: swaths.clone(),
                polarizations: vec![pol],
                output,
                graph,
            });
        }
        Ok(())
    }

    /// Coherence: one request per missing polarization of each consecutive pair.
    pub fn plan_coherence(&self, track: &TrackPartition, ledger: &OutputLedger) -> Plan {
        let mut plan = Plan::default();
        let pairs = match pair_consecutive(&track.dates) {
            Ok(pairs) => pairs,
            Err(error) => {
                reject(&mut plan, Workflow::Coh, track.label(), error);
                return plan;
            }
        };

        // Resolve every date once; pairs sharing a date reuse the result.
        let mut resolved: BTreeMap<NaiveDate, Result<DateGroup>> = BTreeMap::new();
        for group in &track.dates {
            resolved.insert(group.date, self.resolve_date(group));
        }

        for pair in pairs {
            let unit = format!("{}_{}_{}", track.label(), pair.earlier.date, pair.later.date);
            let endpoints = (resolved.get(&pair.earlier.date), resolved.get(&pair.later.date));
            let resolved_pair = match endpoints {
                (Some(Ok(earlier)), Some(Ok(later))) => ProcessingPair {
                    earlier: earlier.clone(),
                    later: later.clone(),
                },
                (Some(Err(e)), _) | (_, Some(Err(e))) => {
                    reject(&mut plan, Workflow::Coh, unit, copy_planning_error(e));
                    continue;
                }
                _ => continue,
            };
            if let Err(error) = self.coherence_unit(&resolved_pair, ledger, &mut plan) {
                reject(&mut plan, Workflow::Coh, unit, error);
            }
        }
        plan
    }

    fn coherence_unit(&self, pair: &ProcessingPair, ledger: &OutputLedger, plan: &mut Plan) -> Result<()> {
        let available =
            common_polarizations(pair.earlier.scenes.iter().chain(pair.later.scenes.iter()));
        let pols = select_polarizations(&self.params.polarizations, &available)?;
        let subswaths = pair.subswaths(&self.params.subswaths);
        validate_subswaths(&subswaths)?;
        let product = coh_product_name(pair);

        let markers = pols
            .iter()
            .map(|p| OutputMarker::new(product.clone(), p.as_str(), self.aoi_name(), self.extension()))
            .collect();
        for marker in self.pending(ledger, markers, plan) {
            let pol: Polarization = marker.leaf.parse()?;
            let output = Self::output_path(ledger, &marker);
            let earlier = scene_paths(&pair.earlier);
            let later = scene_paths(&pair.later);
            let graph = coherence_graph(
                &earlier,
                &later,
                &subswaths,
                pol,
                (pair.earlier.date, pair.later.date),
                self.params,
                &output,
            );
            plan.requests.push(ProcessingRequest {
                workflow: Workflow::Coh,
                marker,
                scene_sets: vec![earlier, later],
                dates: vec![pair.earlier.date, pair.later.date],
                swaths: swath_selection(&subswaths, None),
                polarizations: vec![pol],
                output,
                graph,
            });
        }
        Ok(())
    }

    /// H/A/Alpha: one request per missing decomposition feature of each date.
    pub fn plan_decomposition(&self, track: &TrackPartition, ledger: &OutputLedger) -> Plan {
        let mut plan = Plan::default();
        for group in &track.dates {
            let unit = format!("{}_{}", track.label(), group.date);
            if let Err(error) = self.decomposition_unit(group, ledger, &mut plan) {
                reject(&mut plan, Workflow::Ha, unit, error);
            }
        }
        plan
    }

    fn decomposition_unit(&self, group: &DateGroup, ledger: &OutputLedger, plan: &mut Plan) -> Result<()> {
        let pols = common_polarizations(group.scenes.iter());
        if pols.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "H/A/Alpha needs a dual-pol scene, {} carries {}",
                group.first().product_id(),
                pols.iter().map(|p| p.as_str()).collect::<Vec<_>>().join("+")
            )));
        }
        let group = self.resolve_date(group)?;
        let subswaths = group.subswaths(&self.params.subswaths);
        validate_subswaths(&subswaths)?;
        let swaths = swath_selection(&subswaths, group.bursts.as_ref());
        let product = ha_product_name(&group);

        let features = self.params.decomposition_features.clone();
        let markers = features
            .iter()
            .map(|f| OutputMarker::new(product.clone(), f.as_str(), self.aoi_name(), self.extension()))
            .collect();
        let pending = self.pending(ledger, markers, plan);
        for feature in features {
            let Some(marker) = pending.iter().find(|m| m.leaf == feature.as_str()).cloned() else {
                continue;
            };
            let output = Self::output_path(ledger, &marker);
            let scenes = scene_paths(&group);
            let graph = decomposition_graph(&scenes, &swaths, &pols, feature, self.params, &output);
            plan.requests.push(ProcessingRequest {
                workflow: Workflow::Ha,
                marker,
                scene_sets: vec![scenes],
                dates: vec![group.date],
                swaths: swaths.clone(),
                polarizations: pols.clone(),
                output,
                graph,
            });
        }
        Ok(())
    }

    pub fn plan_track(&self, track: &TrackPartition, workflow: Workflow, ledger: &OutputLedger) -> Plan {
        match workflow {
            Workflow::Int => self.plan_intensity(track, ledger),
            Workflow::Coh => self.plan_coherence(track, ledger),
            Workflow::Ha => self.plan_decomposition(track, ledger),
        }
    }

    /// Plan every track for every workflow. Tracks are planned in parallel;
    /// the result keeps track order.
    pub fn plan<F>(&self, tracks: &[TrackPartition], workflows: &[Workflow], ledger_for: F) -> Plan
    where
        F: Fn(Workflow) -> OutputLedger + Sync,
    {
        let plans: Vec<Plan> = tracks
            .par_iter()
            .map(|track| {
                let mut plan = Plan::default();
                for workflow in workflows {
                    plan.extend(self.plan_track(track, *workflow, &ledger_for(*workflow)));
                }
                plan
            })
            .collect();

        let mut merged = Plan::default();
        for plan in plans {
            merged.extend(plan);
        }
        info!(
            "Planned {} request(s), {} output(s) already present, {} unit(s) rejected",
            merged.requests.len(),
            merged.skipped.len(),
            merged.rejected.len()
        );
        merged
    }
}

fn reject(plan: &mut Plan, workflow: Workflow, unit: String, error: Error) {
    match error.kind() {
        ErrorKind::NoOverlap => info!("{} {}: {}", workflow, unit, error),
        _ => warn!("{} {} rejected: {}", workflow, unit, error),
    }
    plan.rejected.push(Rejection {
        workflow,
        unit,
        error,
    });
}

/// Planning errors are reported once per affected pair; rebuild the shared
/// per-date error for each of them. The copy keeps the original's [`ErrorKind`].
fn copy_planning_error(error: &Error) -> Error {
    match error {
        Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), e.to_string())),
        Error::Xml(_) | Error::Json(_) | Error::Zip(_) => Error::Metadata(error.to_string()),
        Error::MalformedMetadata {
            source_name,
            reason,
        } => Error::malformed(source_name.clone(), reason.clone()),
        Error::NoAoiOverlap { aoi, date } => Error::NoAoiOverlap {
            aoi: aoi.clone(),
            date: *date,
        },
        Error::InvalidPartition(msg) => Error::InvalidPartition(msg.clone()),
        Error::InsufficientTemporalCoverage { dates } => {
            Error::InsufficientTemporalCoverage { dates: *dates }
        }
        Error::EngineFailure { unit, message } => Error::EngineFailure {
            unit: unit.clone(),
            message: message.clone(),
        },
        Error::Metadata(msg) => Error::Metadata(msg.clone()),
        Error::InvalidArgument { arg, value } => Error::InvalidArgument {
            arg: *arg,
            value: value.clone(),
        },
        Error::MissingArgument { arg } => Error::MissingArgument { arg: arg.clone() },
        Error::InvalidInput(msg) => Error::InvalidInput(msg.clone()),
    }
}
