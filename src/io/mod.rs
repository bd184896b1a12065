//! Adapters to the collaborators of the planner: SAFE product access, the
//! scene catalog, AOI geometry, the processing engine and the failure log.
pub mod aoi;
pub mod catalog;
pub mod engine;
pub mod failures;
pub mod safe;

pub use aoi::Aoi;
pub use catalog::{ArchiveCatalog, SceneCatalog, SceneQuery};
pub use engine::{DryRunEngine, GptEngine, ProcessingEngine};
pub use failures::{FailureLog, FailureRecord};
pub use safe::{AnnotationSource, SafeArchive};
