//! Declarative operation graphs handed to the external engine.
//!
//! A graph is a list of named operator nodes wired by source references, the
//! shape SNAP's `gpt` consumes. Builders exist for the three workflows; each
//! produces one graph per leaf output (polarization or decomposition feature).
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;

use crate::core::params::ProcessingParams;
use crate::core::planning::bursts::{BurstRange, BurstSubset};
use crate::error::Result;
use crate::types::{DecompositionFeature, Polarization, ReferencePlane, SubSwath};

/// One operator invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub operator: String,
    /// Ids of upstream nodes, in port order
    pub sources: Vec<String>,
    pub parameters: Vec<(String, String)>,
}

impl GraphNode {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationGraph {
    nodes: Vec<GraphNode>,
}

fn param(name: &str, value: impl ToString) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn list(values: &[String]) -> String {
    values.join(",")
}

impl OperationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id. Ids repeat the operator name, with a
    /// `(n)` suffix from the second occurrence on.
    pub fn add_node(
        &mut self,
        operator: &str,
        sources: &[String],
        parameters: Vec<(String, String)>,
    ) -> String {
        let seen = self.nodes.iter().filter(|n| n.operator == operator).count();
        let id = if seen == 0 {
            operator.to_string()
        } else {
            format!("{}({})", operator, seen + 1)
        };
        self.nodes.push(GraphNode {
            id: id.clone(),
            operator: operator.to_string(),
            sources: sources.to_vec(),
            parameters,
        });
        id
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn operators(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.operator.as_str()).collect()
    }

    pub fn nodes_of<'a>(&'a self, operator: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes.iter().filter(move |n| n.operator == operator)
    }

    /// Render as SNAP graph XML.
    pub fn to_snap_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("graph").with_attributes([("id", "Graph")]),
        ))?;
        text_element(&mut writer, "version", "1.0")?;

        for node in &self.nodes {
            writer.write_event(Event::Start(
                BytesStart::new("node").with_attributes([("id", node.id.as_str())]),
            ))?;
            text_element(&mut writer, "operator", &node.operator)?;

            writer.write_event(Event::Start(BytesStart::new("sources")))?;
            for (i, source) in node.sources.iter().enumerate() {
                let port = if i == 0 {
                    "sourceProduct".to_string()
                } else {
                    format!("sourceProduct.{i}")
                };
                writer.write_event(Event::Empty(
                    BytesStart::new(port.as_str()).with_attributes([("refid", source.as_str())]),
                ))?;
            }
            writer.write_event(Event::End(BytesEnd::new("sources")))?;

            writer.write_event(Event::Start(BytesStart::new("parameters")))?;
            for (name, value) in &node.parameters {
                text_element(&mut writer, name, value)?;
            }
            writer.write_event(Event::End(BytesEnd::new("parameters")))?;
            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("graph")))?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Sub-swath to split, with the AOI burst range when one was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwathSelection {
    pub subswath: SubSwath,
    pub bursts: Option<BurstRange>,
}

pub fn swath_selection(subswaths: &[SubSwath], bursts: Option<&BurstSubset>) -> Vec<SwathSelection> {
    subswaths
        .iter()
        .map(|sw| SwathSelection {
            subswath: *sw,
            bursts: bursts.and_then(|b| b.get(*sw)),
        })
        .collect()
}

fn pol_list(pols: &[Polarization]) -> String {
    pols.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(",")
}

/// Read nodes for the scenes of one date, slice-assembled when there are several.
fn read_date(graph: &mut OperationGraph, scenes: &[PathBuf], pols: &[Polarization]) -> String {
    let readers: Vec<String> = scenes
        .iter()
        .map(|scene| {
            graph.add_node(
                "Read",
                &[],
                vec![
                    param("file", scene.display()),
                    param("copyMetadata", true),
                ],
            )
        })
        .collect();
    if readers.len() == 1 {
        return readers[0].clone();
    }
    graph.add_node(
        "SliceAssembly",
        &readers,
        vec![param("selectedPolarisations", pol_list(pols))],
    )
}

fn split(
    graph: &mut OperationGraph,
    source: &str,
    swath: &SwathSelection,
    pols: &[Polarization],
    with_bursts: bool,
) -> String {
    let mut parameters = vec![
        param("subswath", swath.subswath),
        param("selectedPolarisations", pol_list(pols)),
    ];
    if let (true, Some(range)) = (with_bursts, swath.bursts) {
        parameters.push(param("firstBurstIndex", range.first));
        parameters.push(param("lastBurstIndex", range.last));
    }
    graph.add_node("TOPSAR-Split", &[source.to_string()], parameters)
}

fn apply_orbit(graph: &mut OperationGraph, source: &str, params: &ProcessingParams) -> String {
    graph.add_node(
        "Apply-Orbit-File",
        &[source.to_string()],
        vec![
            param("orbitType", params.orbit_type.snap_name()),
            param("polyDegree", 3),
            param("continueOnFail", params.continue_on_orbit_failure),
        ],
    )
}

fn merge_if_needed(graph: &mut OperationGraph, branches: Vec<String>, pols: &[Polarization]) -> String {
    if branches.len() == 1 {
        return branches[0].clone();
    }
    graph.add_node(
        "TOPSAR-Merge",
        &branches,
        vec![param("selectedPolarisations", pol_list(pols))],
    )
}

fn dem_parameters(params: &ProcessingParams, egm: bool) -> Vec<(String, String)> {
    let mut out = vec![param("demName", params.dem_name())];
    if let Some(file) = params.dem_file() {
        out.push(param("externalDEMFile", file.display()));
    }
    out.push(param("externalDEMNoDataValue", params.external_dem_no_data));
    out.push(param("externalDEMApplyEGM", egm));
    out
}

fn multilook(graph: &mut OperationGraph, source: &str, bands: &[String], params: &ProcessingParams) -> String {
    graph.add_node(
        "Multilook",
        &[source.to_string()],
        vec![
            param("sourceBands", list(bands)),
            param("nRgLooks", params.ml_range_looks),
            param("nAzLooks", params.ml_azimuth_looks),
            param("grSquarePixel", true),
            param("outputIntensity", false),
        ],
    )
}

#[allow(clippy::too_many_arguments)]
fn terrain_correction(
    graph: &mut OperationGraph,
    source: &str,
    bands: &[String],
    params: &ProcessingParams,
    img_resampling: &str,
    dem_resampling: &str,
    resolution: f64,
) -> String {
    let mut parameters = vec![param("sourceBands", list(bands))];
    parameters.extend(dem_parameters(params, params.external_dem_egm));
    parameters.extend([
        param("imgResamplingMethod", img_resampling),
        param("demResamplingMethod", dem_resampling),
        param("pixelSpacingInMeter", resolution),
        param("mapProjection", params.map_projection()),
        param("saveSelectedSourceBand", true),
        param("nodataValueAtSea", params.mask_no_data),
    ]);
    graph.add_node("Terrain-Correction", &[source.to_string()], parameters)
}

fn write(graph: &mut OperationGraph, source: &str, output: &Path, params: &ProcessingParams) -> String {
    graph.add_node(
        "Write",
        &[source.to_string()],
        vec![
            param("file", output.display()),
            param("formatName", params.output_format.snap_name()),
        ],
    )
}

/// Band name after calibration: sub-swath qualified unless swaths were merged.
fn band(prefix: &str, swaths: &[SwathSelection], pol: Polarization) -> String {
    match swaths {
        [only] => format!("{}_{}_{}", prefix, only.subswath, pol),
        _ => format!("{}_{}", prefix, pol),
    }
}

/// Intensity chain: split, orbit, calibration, deburst, merge, multilook,
/// terrain flattening, speckle filter, terrain correction, optional dB.
pub fn intensity_graph(
    scenes: &[PathBuf],
    swaths: &[SwathSelection],
    pol: Polarization,
    params: &ProcessingParams,
    output: &Path,
) -> OperationGraph {
    let mut g = OperationGraph::new();
    let pols = [pol];
    let read = read_date(&mut g, scenes, &pols);

    let branches: Vec<String> = swaths
        .iter()
        .map(|swath| {
            let split = split(&mut g, &read, swath, &pols, true);
            let orbit = apply_orbit(&mut g, &split, params);
            let cal = g.add_node(
                "Calibration",
                &[orbit],
                vec![
                    param("selectedPolarisations", pol),
                    param("createBetaBand", false),
                    param("outputBetaBand", true),
                    param("outputSigmaBand", false),
                ],
            );
            g.add_node(
                "TOPSAR-Deburst",
                &[cal],
                vec![param("selectedPolarisations", pol)],
            )
        })
        .collect();
    let merged = merge_if_needed(&mut g, branches, &pols);

    let beta = vec![band("Beta0", swaths, pol)];
    let reference = match params.reference_plane {
        ReferencePlane::Gamma => vec![band("Gamma0", swaths, pol)],
        ReferencePlane::Sigma => vec![band("Sigma0", swaths, pol)],
    };

    let ml = multilook(&mut g, &merged, &beta, params);

    let mut tf_params = vec![param("sourceBands", list(&beta))];
    tf_params.extend(dem_parameters(params, true));
    tf_params.extend([
        param("demResamplingMethod", params.dem_resampling.snap_name()),
        param("additionalOverlap", 0.1),
        param("oversamplingMultiple", 1.0),
    ]);
    if params.reference_plane == ReferencePlane::Sigma {
        tf_params.push(param("outputSigma0", true));
    }
    let tf = g.add_node("Terrain-Flattening", &[ml], tf_params);

    let sf = g.add_node(
        "Speckle-Filter",
        &[tf],
        vec![
            param("sourceBands", list(&reference)),
            param("filter", params.speckle_filter.snap_name()),
            param("filterSizeX", params.filter_size_x),
            param("filterSizeY", params.filter_size_y),
        ],
    );
    let mut last = terrain_correction(
        &mut g,
        &sf,
        &reference,
        params,
        params.img_resampling.snap_name(),
        params.dem_resampling.snap_name(),
        params.resolution_int,
    );
    if params.linear_to_db {
        last = g.add_node(
            "LinearToFromdB",
            &[last],
            vec![param("sourceBands", list(&reference))],
        );
    }
    write(&mut g, &last, output, params);
    g
}

/// Coherence chain for one date pair. The split carries no burst indices:
/// both dates must be split identically for back-geocoding.
#[allow(clippy::too_many_arguments)]
pub fn coherence_graph(
    earlier: &[PathBuf],
    later: &[PathBuf],
    subswaths: &[SubSwath],
    pol: Polarization,
    dates: (NaiveDate, NaiveDate),
    params: &ProcessingParams,
    output: &Path,
) -> OperationGraph {
    let mut g = OperationGraph::new();
    let pols = [pol];
    let swaths = swath_selection(subswaths, None);
    let master = read_date(&mut g, earlier, &pols);
    let slave = read_date(&mut g, later, &pols);

    let branches: Vec<String> = swaths
        .iter()
        .map(|swath| {
            let s1 = split(&mut g, &master, swath, &pols, false);
            let o1 = apply_orbit(&mut g, &s1, params);
            let s2 = split(&mut g, &slave, swath, &pols, false);
            let o2 = apply_orbit(&mut g, &s2, params);

            let mut bgc_params = dem_parameters(params, true);
            bgc_params.extend([
                param("demResamplingMethod", params.bgc_dem_resampling.snap_name()),
                param("resamplingType", "BISINC_5_POINT_INTERPOLATION"),
                param("maskOutAreaWithoutElevation", params.mask_no_data),
            ]);
            let bgc = g.add_node("Back-Geocoding", &[o1, o2], bgc_params);

            let mut coh_params = vec![
                param("subtractFlatEarthPhase", true),
                param("singleMaster", true),
                param("cohWinRg", params.coh_window_range),
                param("cohWinAz", params.coh_window_azimuth),
                param("subtractTopographicPhase", true),
            ];
            coh_params.extend(dem_parameters(params, true));
            let coh = g.add_node("Coherence", &[bgc], coh_params);
            g.add_node(
                "TOPSAR-Deburst",
                &[coh],
                vec![param("selectedPolarisations", pol)],
            )
        })
        .collect();
    let merged = merge_if_needed(&mut g, branches, &pols);

    // Coherence bands name the later date first.
    let stamp = |d: NaiveDate| d.format("%d%b%Y").to_string();
    let coh_band = match swaths.as_slice() {
        [only] => format!("coh_{}_{}_{}_{}", only.subswath, pol, stamp(dates.1), stamp(dates.0)),
        _ => format!("coh_{}_{}_{}", pol, stamp(dates.1), stamp(dates.0)),
    };
    let bands = vec![coh_band];
    let ml = multilook(&mut g, &merged, &bands, params);
    let tc = terrain_correction(
        &mut g,
        &ml,
        &bands,
        params,
        params.tc_dem_resampling.snap_name(),
        params.tc_dem_resampling.snap_name(),
        params.resolution_coh,
    );
    write(&mut g, &tc, output, params);
    g
}

/// Dual-pol H/A/Alpha chain producing one decomposition feature.
pub fn decomposition_graph(
    scenes: &[PathBuf],
    swaths: &[SwathSelection],
    pols: &[Polarization],
    feature: DecompositionFeature,
    params: &ProcessingParams,
    output: &Path,
) -> OperationGraph {
    let mut g = OperationGraph::new();
    let read = read_date(&mut g, scenes, pols);

    let branches: Vec<String> = swaths
        .iter()
        .map(|swath| {
            let split = split(&mut g, &read, swath, pols, true);
            let orbit = apply_orbit(&mut g, &split, params);
            let cal = g.add_node(
                "Calibration",
                &[orbit],
                vec![
                    param("selectedPolarisations", pol_list(pols)),
                    param("createBetaBand", false),
                    param("outputBetaBand", false),
                    param("outputSigmaBand", true),
                    param("outputImageInComplex", true),
                ],
            );
            g.add_node(
                "TOPSAR-Deburst",
                &[cal],
                vec![param("selectedPolarisations", pol_list(pols))],
            )
        })
        .collect();
    let merged = merge_if_needed(&mut g, branches, pols);

    let matrix = g.add_node(
        "Polarimetric-Matrices",
        &[merged],
        vec![param("matrix", "C2")],
    );
    let c2: Vec<String> = ["C11", "C12_real", "C12_imag", "C22"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let ml = multilook(&mut g, &matrix, &c2, params);
    let filtered = g.add_node(
        "Polarimetric-Speckle-Filter",
        &[ml],
        vec![param("filter", params.ha_speckle_filter.snap_name())],
    );
    let decomposition = g.add_node(
        "Polarimetric-Decomposition",
        &[filtered],
        vec![
            param("decomposition", "H-Alpha Dual Pol Decomposition"),
            param("windowSize", params.decomposition_window),
            param("outputHAAlpha", true),
        ],
    );
    let tc = terrain_correction(
        &mut g,
        &decomposition,
        &[feature.as_str().to_string()],
        params,
        params.img_resampling.snap_name(),
        params.dem_resampling.snap_name(),
        params.resolution_ha,
    );
    write(&mut g, &tc, output, params);
    g
}
