//! AOI burst subsets: which bursts of which sub-swaths a date's processing
//! unit needs so that it covers the area of interest.
//!
//! Per scene, the covered range of a sub-swath is `[min, max]` over the bursts
//! whose footprint intersects the AOI. Scenes of one date are folded in
//! acquisition order. A sub-swath seen for the first time takes the scene's
//! range as is. For a sub-swath already present, the scene's last burst index
//! is *added* to the accumulated upper bound: the scenes are slice-assembled
//! before the split, so burst numbering of a later scene continues after the
//! bursts of the earlier one.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::planning::geometry::{BurstFootprint, footprints_from_annotation};
use crate::error::{Error, Result};
use crate::io::aoi::Aoi;
use crate::io::safe::AnnotationSource;
use crate::types::{Acquisition, SubSwath};

/// Inclusive, 1-based burst index range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstRange {
    pub first: u32,
    pub last: u32,
}

impl BurstRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }
}

/// Burst ranges covered by a single scene, keyed by sub-swath.
pub type SceneBursts = BTreeMap<SubSwath, BurstRange>;

/// Accumulated burst subset of one processing unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstSubset {
    ranges: BTreeMap<SubSwath, BurstRange>,
}

impl BurstSubset {
    pub fn get(&self, subswath: SubSwath) -> Option<BurstRange> {
        self.ranges.get(&subswath).copied()
    }

    /// Sub-swaths with any AOI overlap, in IW order.
    pub fn subswaths(&self) -> Vec<SubSwath> {
        self.ranges.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubSwath, BurstRange)> + '_ {
        self.ranges.iter().map(|(k, v)| (*k, *v))
    }

    /// One fold step: returns the subset extended by the next scene's ranges.
    pub fn extend_with(&self, scene: &SceneBursts) -> BurstSubset {
        let mut ranges = self.ranges.clone();
        for (subswath, range) in scene {
            ranges
                .entry(*subswath)
                .and_modify(|acc| acc.last += range.last)
                .or_insert(*range);
        }
        BurstSubset { ranges }
    }
}

impl FromIterator<(SubSwath, BurstRange)> for BurstSubset {
    fn from_iter<I: IntoIterator<Item = (SubSwath, BurstRange)>>(iter: I) -> Self {
        BurstSubset {
            ranges: iter.into_iter().collect(),
        }
    }
}

/// Fold per-scene ranges (in acquisition order) into one subset.
pub fn accumulate<'a, I>(scenes: I) -> BurstSubset
where
    I: IntoIterator<Item = &'a SceneBursts>,
{
    scenes
        .into_iter()
        .fold(BurstSubset::default(), |acc, scene| acc.extend_with(scene))
}

/// Per sub-swath `[min, max]` over the bursts whose footprint intersects the AOI.
pub fn scene_bursts(footprints: &[BurstFootprint], aoi: &Aoi) -> SceneBursts {
    let mut ranges = SceneBursts::new();
    for fp in footprints.iter().filter(|fp| aoi.intersects(&fp.polygon)) {
        ranges
            .entry(fp.subswath)
            .and_modify(|r| {
                r.first = r.first.min(fp.burst);
                r.last = r.last.max(fp.burst);
            })
            .or_insert(BurstRange::new(fp.burst, fp.burst));
    }
    ranges
}

/// Burst footprints of every sub-swath of one scene.
pub fn scene_footprints<A>(scene: &Acquisition, source: &A) -> Result<Vec<BurstFootprint>>
where
    A: AnnotationSource + ?Sized,
{
    let pol = scene.polarizations.first().copied().ok_or_else(|| {
        Error::Metadata(format!(
            "no polarization listed for {}",
            scene.path.display()
        ))
    })?;

    let mut footprints = Vec::new();
    for subswath in SubSwath::ALL {
        let xml = source.annotation(scene, subswath, pol)?;
        let source_name = format!("{} {} {}", scene.product_id(), subswath, pol);
        footprints.extend(footprints_from_annotation(&xml, subswath, &source_name)?);
    }
    Ok(footprints)
}

/// Resolve the burst subset of the scenes of one date.
///
/// `scenes` must be ordered by start time and belong to one calendar date.
/// An AOI that touches no burst yields `NoAoiOverlap`.
pub fn resolve_date_bursts<A>(scenes: &[Acquisition], aoi: &Aoi, source: &A) -> Result<BurstSubset>
where
    A: AnnotationSource + ?Sized,
{
    let first = scenes
        .first()
        .ok_or_else(|| Error::InvalidInput("no scenes to resolve bursts for".to_string()))?;

    let subset = scenes.iter().try_fold(BurstSubset::default(), |acc, scene| {
        let footprints = scene_footprints(scene, source)?;
        let covered = scene_bursts(&footprints, aoi);
        debug!(
            "AOI {} covers {:?} in {}",
            aoi.name,
            covered,
            scene.product_id()
        );
        Ok::<_, Error>(acc.extend_with(&covered))
    })?;

    if subset.is_empty() {
        return Err(Error::NoAoiOverlap {
            aoi: aoi.name.clone(),
            date: first.date(),
        });
    }
    Ok(subset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planning::geometry::tests::synthetic_annotation;
    use crate::core::planning::testing::{InMemoryAnnotations, acquisition};
    use crate::types::Polarization;
    use geo::{LineString, Polygon};

    fn rect(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Aoi {
        let ring = LineString::from(vec![
            (lon_min, lat_min),
            (lon_max, lat_min),
            (lon_max, lat_max),
            (lon_min, lat_max),
        ]);
        Aoi::from_polygon("field", Polygon::new(ring, vec![]))
    }

    /// IW1 at lon 0-1, IW2 at lon 2-3, IW3 at lon 4-5; 9 bursts each, burst b at lat [b-1, b].
    fn three_swaths(scene: &Acquisition, store: &mut InMemoryAnnotations) {
        for (i, sw) in SubSwath::ALL.iter().enumerate() {
            store.insert(
                scene,
                *sw,
                Polarization::VV,
                synthetic_annotation(9, i as f64 * 2.0, 0.0),
            );
        }
    }

    #[test]
    fn aoi_outside_all_bursts_is_no_overlap() {
        let scene = acquisition("S1A_20210503T052740_AAAA", 117, "2021-05-03T05:27:40");
        let mut store = InMemoryAnnotations::default();
        three_swaths(&scene, &mut store);

        let err = resolve_date_bursts(&[scene], &rect(40.0, 40.0, 41.0, 41.0), &store).unwrap_err();
        assert!(matches!(err, Error::NoAoiOverlap { .. }));
    }

    #[test]
    fn aoi_inside_bursts_three_to_five_of_iw2_only() {
        let scene = acquisition("S1A_20210503T052740_AAAA", 117, "2021-05-03T05:27:40");
        let mut store = InMemoryAnnotations::default();
        three_swaths(&scene, &mut store);

        let subset = resolve_date_bursts(&[scene], &rect(2.2, 2.2, 2.8, 4.8), &store).unwrap();
        let expected: BurstSubset = [(SubSwath::IW2, BurstRange::new(3, 5))].into_iter().collect();
        assert_eq!(subset, expected);
        assert_eq!(subset.subswaths(), vec![SubSwath::IW2]);
    }

    #[test]
    fn same_sub_swath_in_later_scene_extends_upper_bound_additively() {
        let first: SceneBursts = [(SubSwath::IW1, BurstRange::new(1, 3))].into_iter().collect();
        let second: SceneBursts = [(SubSwath::IW1, BurstRange::new(1, 2))].into_iter().collect();

        let subset = accumulate([&first, &second]);
        assert_eq!(subset.get(SubSwath::IW1), Some(BurstRange::new(1, 5)));
    }

    #[test]
    fn new_sub_swath_in_later_scene_is_inserted_unchanged() {
        let first: SceneBursts = [(SubSwath::IW1, BurstRange::new(2, 4))].into_iter().collect();
        let second: SceneBursts = [
            (SubSwath::IW1, BurstRange::new(1, 1)),
            (SubSwath::IW2, BurstRange::new(6, 8)),
        ]
        .into_iter()
        .collect();

        let step = BurstSubset::default().extend_with(&first);
        let next = step.extend_with(&second);
        // The fold does not touch the previous accumulator.
        assert_eq!(step.get(SubSwath::IW1), Some(BurstRange::new(2, 4)));
        assert_eq!(next.get(SubSwath::IW1), Some(BurstRange::new(2, 5)));
        assert_eq!(next.get(SubSwath::IW2), Some(BurstRange::new(6, 8)));
    }

    #[test]
    fn two_scenes_of_one_date_are_folded_in_order() {
        let a = acquisition("S1A_20210503T052740_AAAA", 117, "2021-05-03T05:27:40");
        let b = acquisition("S1A_20210503T052805_BBBB", 117, "2021-05-03T05:28:05");
        let mut store = InMemoryAnnotations::default();
        three_swaths(&a, &mut store);
        // Second scene continues further north: bursts at lat [9 + b - 1, 9 + b].
        for (i, sw) in SubSwath::ALL.iter().enumerate() {
            store.insert(
                &b,
                *sw,
                Polarization::VV,
                synthetic_annotation(9, i as f64 * 2.0, 9.0),
            );
        }

        // IW1, lat 6.5..10.5: bursts 7-9 of the first scene, 1-2 of the second.
        let subset = resolve_date_bursts(&[a, b], &rect(0.2, 6.5, 0.8, 10.5), &store).unwrap();
        assert_eq!(subset.get(SubSwath::IW1), Some(BurstRange::new(7, 11)));
        assert_eq!(subset.subswaths(), vec![SubSwath::IW1]);
    }
}
