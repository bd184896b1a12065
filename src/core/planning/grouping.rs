//! Acquisition grouping: orbit direction, then relative orbit, then calendar date.
//!
//! Grouping keys form a closed set ([`GroupKey`]); each maps to a plain accessor
//! function over [`Acquisition`]. The result is a flat list of
//! [`TrackPartition`]s, one per (direction, relative orbit), each holding its
//! [`DateGroup`]s in ascending date order.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::core::planning::bursts::BurstSubset;
use crate::error::{Error, Result};
use crate::types::{Acquisition, OrbitDirection, SubSwath};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    OrbitDirection,
    RelativeOrbit,
    Date,
}

/// Value of a [`GroupKey`] for one acquisition; ordering follows the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GroupValue {
    OrbitDirection(OrbitDirection),
    RelativeOrbit(u32),
    Date(NaiveDate),
}

fn orbit_direction(scene: &Acquisition) -> GroupValue {
    GroupValue::OrbitDirection(scene.orbit_direction)
}

fn relative_orbit(scene: &Acquisition) -> GroupValue {
    GroupValue::RelativeOrbit(scene.relative_orbit)
}

fn acquisition_date(scene: &Acquisition) -> GroupValue {
    GroupValue::Date(scene.date())
}

impl GroupKey {
    pub fn accessor(self) -> fn(&Acquisition) -> GroupValue {
        match self {
            GroupKey::OrbitDirection => orbit_direction,
            GroupKey::RelativeOrbit => relative_orbit,
            GroupKey::Date => acquisition_date,
        }
    }
}

/// Split scenes by one key. Groups come out ascending by key value; members
/// keep their input order. A uniform input yields exactly one group.
pub fn group_by(scenes: Vec<Acquisition>, key: GroupKey) -> Vec<(GroupValue, Vec<Acquisition>)> {
    let value_of = key.accessor();
    let mut groups: BTreeMap<GroupValue, Vec<Acquisition>> = BTreeMap::new();
    for scene in scenes {
        groups.entry(value_of(&scene)).or_default().push(scene);
    }
    groups.into_iter().collect()
}

/// Acquisitions of one calendar date within one track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    /// Ascending by start time
    pub scenes: Vec<Acquisition>,
    /// Set once an AOI has been resolved against the date
    pub bursts: Option<BurstSubset>,
}

impl DateGroup {
    /// Fails with `InvalidInput` for an empty scene list.
    pub fn new(date: NaiveDate, mut scenes: Vec<Acquisition>) -> Result<Self> {
        if scenes.is_empty() {
            return Err(Error::InvalidInput(format!("date group {date} has no scenes")));
        }
        scenes.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.path.cmp(&b.path)));
        Ok(Self {
            date,
            scenes,
            bursts: None,
        })
    }

    /// Earliest scene; names the date's outputs.
    pub fn first(&self) -> &Acquisition {
        &self.scenes[0]
    }

    pub fn with_bursts(&self, bursts: BurstSubset) -> Self {
        Self {
            bursts: Some(bursts),
            ..self.clone()
        }
    }

    /// AOI sub-swaths when resolved, otherwise `default`.
    pub fn subswaths(&self, default: &[SubSwath]) -> Vec<SubSwath> {
        match &self.bursts {
            Some(subset) => subset.subswaths(),
            None => default.to_vec(),
        }
    }
}

/// All dates of one (orbit direction, relative orbit) track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPartition {
    pub direction: OrbitDirection,
    pub relative_orbit: u32,
    /// Ascending by date
    pub dates: Vec<DateGroup>,
}

impl TrackPartition {
    pub fn scenes(&self) -> impl Iterator<Item = &Acquisition> {
        self.dates.iter().flat_map(|d| d.scenes.iter())
    }

    pub fn label(&self) -> String {
        format!("{}_relOrb_{}", self.direction.code(), self.relative_orbit)
    }
}

/// Partition scenes into tracks and dates.
///
/// Accepts any collection, including a single acquisition (`[scene]`), which
/// comes back as one track with one date.
pub fn partition<I>(scenes: I) -> Vec<TrackPartition>
where
    I: IntoIterator<Item = Acquisition>,
{
    let scenes: Vec<Acquisition> = scenes.into_iter().collect();
    let mut tracks = Vec::new();

    for (direction_value, by_direction) in group_by(scenes, GroupKey::OrbitDirection) {
        let GroupValue::OrbitDirection(direction) = direction_value else {
            continue;
        };
        for (orbit_value, by_orbit) in group_by(by_direction, GroupKey::RelativeOrbit) {
            let GroupValue::RelativeOrbit(relative_orbit) = orbit_value else {
                continue;
            };
            let dates: Vec<DateGroup> = group_by(by_orbit, GroupKey::Date)
                .into_iter()
                .filter_map(|(value, members)| match value {
                    // group_by never yields an empty group
                    GroupValue::Date(date) => DateGroup::new(date, members).ok(),
                    _ => None,
                })
                .collect();
            debug!(
                "Track {}_relOrb_{}: {} date(s)",
                direction.code(),
                relative_orbit,
                dates.len()
            );
            tracks.push(TrackPartition {
                direction,
                relative_orbit,
                dates,
            });
        }
    }
    tracks
}
