//! Rescue runs: re-plan the scenes of dates whose processing failed.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::core::planning::grouping::partition;
use crate::types::Acquisition;

/// Scene runs covering every failed date, one track at a time.
///
/// Each run is a contiguous slice of its track's dates: the failed dates plus
/// their direct neighbours no more than `max_gap_days` away. A pair formed
/// inside a run is therefore always a consecutive pair of the full track.
/// Neighbouring dates that already succeeded are left to the output ledger.
pub fn rescue_runs(
    failed_dates: &BTreeSet<NaiveDate>,
    scenes: &[Acquisition],
    max_gap_days: i64,
) -> Vec<Vec<Acquisition>> {
    let mut runs: Vec<Vec<Acquisition>> = Vec::new();

    for track in partition(scenes.iter().cloned()) {
        let failed: Vec<bool> = track
            .dates
            .iter()
            .map(|g| failed_dates.contains(&g.date))
            .collect();
        if !failed.contains(&true) {
            continue;
        }
        // linked[i]: dates i and i + 1 belong to the same run
        let linked: Vec<bool> = track
            .dates
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                (failed[i] || failed[i + 1]) && (w[1].date - w[0].date).num_days() <= max_gap_days
            })
            .collect();

        let mut run: Vec<Acquisition> = Vec::new();
        for (i, group) in track.dates.iter().enumerate() {
            let from_previous = i > 0 && linked[i - 1];
            let to_next = linked.get(i).copied().unwrap_or(false);
            if !from_previous && !run.is_empty() {
                runs.push(std::mem::take(&mut run));
            }
            if failed[i] || from_previous || to_next {
                run.extend(group.scenes.iter().cloned());
            }
        }
        if !run.is_empty() {
            runs.push(run);
        }
    }

    debug!(
        "{} failed date(s) map to {} rescue run(s)",
        failed_dates.len(),
        runs.len()
    );
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planning::pairing::pair_acquisitions;
    use crate::core::planning::testing::acquisition;

    fn dates(days: &[(u32, u32)]) -> BTreeSet<NaiveDate> {
        days.iter()
            .map(|(m, d)| NaiveDate::from_ymd_opt(2021, *m, *d).unwrap())
            .collect()
    }

    fn archive() -> Vec<Acquisition> {
        vec![
            acquisition("S1A_0503", 117, "2021-05-03T05:27:40"),
            acquisition("S1A_0509", 117, "2021-05-09T05:27:40"),
            acquisition("S1A_0515", 117, "2021-05-15T05:27:40"),
            acquisition("S1A_0621", 117, "2021-06-21T05:27:40"),
            acquisition("S1A_0627", 117, "2021-06-27T05:27:40"),
        ]
    }

    fn ids(runs: &[Vec<Acquisition>]) -> Vec<Vec<String>> {
        runs.iter()
            .map(|r| r.iter().map(|s| s.product_id()).collect())
            .collect()
    }

    #[test]
    fn gap_above_threshold_starts_a_new_run() {
        let failed = dates(&[(5, 3), (5, 9), (6, 21), (6, 27)]);
        let runs = rescue_runs(&failed, &archive(), 12);
        assert_eq!(
            ids(&runs),
            vec![
                vec!["S1A_0503", "S1A_0509", "S1A_0515"],
                vec!["S1A_0621", "S1A_0627"],
            ]
        );
    }

    #[test]
    fn succeeded_dates_between_failures_stay_in_the_run() {
        let failed = dates(&[(5, 3), (5, 15)]);
        let runs = rescue_runs(&failed, &archive(), 12);
        assert_eq!(ids(&runs), vec![vec!["S1A_0503", "S1A_0509", "S1A_0515"]]);

        let pairs = pair_acquisitions(&runs[0]).unwrap();
        let spans: Vec<(NaiveDate, NaiveDate)> =
            pairs.iter().map(|p| (p.earlier.date, p.later.date)).collect();
        let d = dates(&[(5, 3), (5, 9), (5, 15)]).into_iter().collect::<Vec<_>>();
        assert_eq!(spans, vec![(d[0], d[1]), (d[1], d[2])]);
    }

    #[test]
    fn gap_equal_to_threshold_links_neighbours() {
        let failed = dates(&[(6, 21)]);
        assert_eq!(
            ids(&rescue_runs(&failed, &archive(), 6)),
            vec![vec!["S1A_0621", "S1A_0627"]]
        );
        assert_eq!(
            ids(&rescue_runs(&failed, &archive(), 5)),
            vec![vec!["S1A_0621"]]
        );
    }

    #[test]
    fn tracks_are_rescued_separately() {
        let mut scenes = archive();
        scenes.push(acquisition("S1A_0503_44", 44, "2021-05-03T17:10:00"));
        scenes.push(acquisition("S1A_0515_44", 44, "2021-05-15T17:10:00"));
        let failed = dates(&[(5, 15)]);
        let runs = rescue_runs(&failed, &scenes, 12);
        assert_eq!(
            ids(&runs),
            vec![
                vec!["S1A_0503_44", "S1A_0515_44"],
                vec!["S1A_0509", "S1A_0515"],
            ]
        );
    }

    #[test]
    fn unknown_dates_yield_no_runs() {
        let failed = dates(&[(1, 1)]);
        assert!(rescue_runs(&failed, &archive(), 12).is_empty());
    }
}
