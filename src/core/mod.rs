//! Core building blocks: processing parameters and the planning pipeline
//! consumed by the high-level `api` module.
pub mod params;
pub mod planning;
