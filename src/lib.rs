#![doc = r#"
SARPLAN: planning and sequencing of Sentinel-1 IW SLC processing jobs.

The crate decides *what* an external SAR engine (SNAP `gpt`) should compute
and never touches pixels itself. Given a directory of SLC products it

- extracts per-burst footprints from the annotation geolocation grids,
- resolves the bursts an area of interest (AOI) touches, per date,
- groups acquisitions by orbit direction, relative orbit and date,
- pairs consecutive dates for coherence,
- and skips every output that already exists, so reruns only fill gaps.

Three workflows are planned: calibrated intensity (`INT`), interferometric
coherence (`COH`) and H/A/Alpha decomposition (`HA`). Each planned unit
carries a processing graph the engine can run as-is.

Add dependency
--------------
```toml
[dependencies]
sarplan = "0.1"
```

Plan a directory
----------------
```rust,no_run
use std::path::PathBuf;
use sarplan::{api, PlannerConfig, Workflow};

fn main() -> sarplan::Result<()> {
    let config = PlannerConfig {
        data_dir: Some(PathBuf::from("/data/s1")),
        workflows: vec![Workflow::Int, Workflow::Coh],
        aoi: Some(PathBuf::from("/data/aoi.geojson")),
        ..PlannerConfig::default()
    };

    let plan = api::plan_directory(&config)?;
    for request in &plan.requests {
        println!("{} -> {}", request.unit_name(), request.output.display());
    }
    println!("{} already done, {} rejected", plan.skipped.len(), plan.rejected.len());
    Ok(())
}
```

Run through the engine
----------------------
```rust,no_run
use std::path::Path;
use sarplan::{api, PlannerConfig};

fn main() -> sarplan::Result<()> {
    let config = PlannerConfig::load(Path::new("/etc/sarplan.json"))?;
    let report = api::run(&config, false)?;
    println!(
        "processed={} skipped={} errors={}",
        report.processed, report.skipped, report.errors
    );
    Ok(())
}
```

Planning building blocks
------------------------
```rust,no_run
use sarplan::core::planning::{pair_consecutive, partition};
use sarplan::io::{ArchiveCatalog, SceneCatalog, SceneQuery};

fn main() -> sarplan::Result<()> {
    let catalog = ArchiveCatalog::scan(std::path::Path::new("/data/s1"))?;
    let scenes = catalog.select(&SceneQuery::from_bounds(Some("2021-05-01"), None, None)?)?;
    for track in partition(scenes) {
        let pairs = pair_consecutive(&track.dates)?;
        println!("{}: {} date(s), {} pair(s)", track.label(), track.dates.len(), pairs.len());
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `sarplan::Result<T>`. [`Error::kind`] sorts
failures into the classes a batch reacts to: `NoOverlap`, `InvalidInput`,
`EngineFailure` and `Io`.

Useful modules
--------------
- [`api`]: high-level entry points and the batch report.
- [`core::planning`]: footprints, burst subsets, grouping, pairing, ledger, graphs.
- [`io`]: SAFE archives, scene catalog, AOI, engine adapters, failure log.
- [`types`]: acquisition metadata and processing enums.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

pub use crate::core::params::{EngineConfig, PlannerConfig, PolarizationSelection, ProcessingParams};
pub use crate::core::planning::{
    BurstFootprint, BurstRange, BurstSubset, DateGroup, OutputLedger, OutputMarker, Plan,
    ProcessingPair, ProcessingRequest, TrackPartition,
};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    Acquisition, AcquisitionMode, DecompositionFeature, OrbitDirection, OutputFormat,
    Polarization, SubSwath, Workflow,
};

pub use api::{BatchReport, UnitOutcome, plan_directory, plan_scenes, run};
