//! External processing engine adapters.
//!
//! The engine receives one [`ProcessingRequest`] at a time and either writes
//! the raster or fails. `GptEngine` drives SNAP's `gpt` through a graph file;
//! `DryRunEngine` only writes the graph.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::core::params::EngineConfig;
use crate::core::planning::requests::ProcessingRequest;
use crate::error::{Error, Result};

pub trait ProcessingEngine: Sync {
    fn execute(&self, request: &ProcessingRequest) -> Result<()>;
}

/// Write the request graph to `<graph_dir>/<unit>.xml`.
pub fn write_graph(graph_dir: &Path, request: &ProcessingRequest) -> Result<PathBuf> {
    fs::create_dir_all(graph_dir)?;
    let path = graph_dir.join(format!("{}.xml", request.unit_name()));
    fs::write(&path, request.graph.to_snap_xml()?)?;
    debug!("Graph written to {}", path.display());
    Ok(path)
}

/// Runs `gpt <graph.xml> [args...]`
#[derive(Debug, Clone)]
pub struct GptEngine {
    gpt: PathBuf,
    args: Vec<String>,
    graph_dir: PathBuf,
}

impl GptEngine {
    pub fn new(config: &EngineConfig, tmp_dir: &Path) -> Self {
        Self {
            gpt: config.gpt.clone(),
            args: config.gpt_args.clone(),
            graph_dir: tmp_dir.join("graphs"),
        }
    }
}

impl ProcessingEngine for GptEngine {
    fn execute(&self, request: &ProcessingRequest) -> Result<()> {
        let graph = write_graph(&self.graph_dir, request)?;
        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("gpt: {}", request.marker);
        let unit = request.unit_name();
        let status = Command::new(&self.gpt)
            .arg(&graph)
            .args(self.args.iter().map(|s| s.as_str()))
            .status()
            .map_err(|e| Error::EngineFailure {
                unit: unit.clone(),
                message: format!("{} exec error: {}", self.gpt.display(), e),
            })?;
        if !status.success() {
            return Err(Error::EngineFailure {
                unit,
                message: format!("{} exited with {}", self.gpt.display(), status),
            });
        }
        Ok(())
    }
}

/// Writes graphs without running anything
#[derive(Debug, Clone)]
pub struct DryRunEngine {
    graph_dir: PathBuf,
}

impl DryRunEngine {
    pub fn new(tmp_dir: &Path) -> Self {
        Self {
            graph_dir: tmp_dir.join("graphs"),
        }
    }
}

impl ProcessingEngine for DryRunEngine {
    fn execute(&self, request: &ProcessingRequest) -> Result<()> {
        let graph = write_graph(&self.graph_dir, request)?;
        info!("dry run: {} -> {}", request.marker, graph.display());
        Ok(())
    }
}
