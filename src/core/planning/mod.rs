//! Planning core: burst geometry, AOI burst subsets, grouping, pairing,
//! the output ledger and request construction. Everything here is a pure
//! function of its inputs apart from the ledger's existence checks.
pub mod bursts;
pub mod geometry;
pub mod graph;
pub mod grouping;
pub mod ledger;
pub mod pairing;
pub mod recovery;
pub mod requests;

#[cfg(test)]
pub(crate) mod testing;

pub use bursts::{BurstRange, BurstSubset, SceneBursts, accumulate, resolve_date_bursts};
pub use geometry::{BurstFootprint, GeolocationGrid, burst_footprints, footprints_from_annotation};
pub use grouping::{DateGroup, GroupKey, GroupValue, TrackPartition, group_by, partition};
pub use ledger::{OutputLedger, OutputMarker};
pub use pairing::{ProcessingPair, pair_acquisitions, pair_consecutive};
pub use recovery::rescue_runs;
pub use requests::{Plan, Planner, ProcessingRequest, Rejection};
