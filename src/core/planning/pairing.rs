//! Temporal pairing of consecutive dates within one track.
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::core::planning::grouping::{DateGroup, GroupKey, GroupValue, group_by};
use crate::error::{Error, Result};
use crate::types::{Acquisition, SubSwath};

/// Two dates of one track, `earlier.date < later.date`, with no date of the
/// track between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingPair {
    pub earlier: DateGroup,
    pub later: DateGroup,
}

impl ProcessingPair {
    /// Union of both endpoints' sub-swaths, in IW order.
    pub fn subswaths(&self, default: &[SubSwath]) -> Vec<SubSwath> {
        let set: BTreeSet<SubSwath> = self
            .earlier
            .subswaths(default)
            .into_iter()
            .chain(self.later.subswaths(default))
            .collect();
        set.into_iter().collect()
    }
}

/// Fails with `InvalidPartition` unless every scene shares one orbit
/// direction and one relative orbit.
pub fn ensure_single_track<'a, I>(scenes: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Acquisition>,
{
    let tracks: BTreeSet<_> = scenes
        .into_iter()
        .map(|s| (s.orbit_direction, s.relative_orbit))
        .collect();
    if tracks.len() > 1 {
        let listed: Vec<String> = tracks
            .iter()
            .map(|(dir, rel)| format!("{}_relOrb_{}", dir.code(), rel))
            .collect();
        return Err(Error::InvalidPartition(format!(
            "pairing needs one track, got {}",
            listed.join(", ")
        )));
    }
    Ok(())
}

/// Pair each date group with its immediate successor.
pub fn pair_consecutive(dates: &[DateGroup]) -> Result<Vec<ProcessingPair>> {
    ensure_single_track(dates.iter().flat_map(|d| d.scenes.iter()))?;

    let distinct: BTreeSet<_> = dates.iter().map(|d| d.date).collect();
    if distinct.len() != dates.len() {
        return Err(Error::InvalidPartition(
            "date groups must have distinct dates".to_string(),
        ));
    }
    if distinct.len() < 2 {
        return Err(Error::InsufficientTemporalCoverage {
            dates: distinct.len(),
        });
    }

    let mut ordered = dates.to_vec();
    ordered.sort_by_key(|d| d.date);

    let pairs: Vec<ProcessingPair> = ordered
        .windows(2)
        .map(|w| ProcessingPair {
            earlier: w[0].clone(),
            later: w[1].clone(),
        })
        .collect();
    debug!("{} consecutive pair(s) from {} dates", pairs.len(), ordered.len());
    Ok(pairs)
}

/// Group raw scenes of one track by date and pair consecutive dates.
///
/// Mixed tracks are rejected rather than re-partitioned.
pub fn pair_acquisitions(scenes: &[Acquisition]) -> Result<Vec<ProcessingPair>> {
    ensure_single_track(scenes)?;
    let dates: Vec<DateGroup> = group_by(scenes.to_vec(), GroupKey::Date)
        .into_iter()
        .filter_map(|(value, members)| match value {
            GroupValue::Date(date) => Some(DateGroup::new(date, members)),
            _ => None,
        })
        .collect::<Result<_>>()?;
    pair_consecutive(&dates)
}
