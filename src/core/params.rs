use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{
    AcquisitionMode, DecompositionFeature, OrbitType, OutputFormat, PolarimetricFilter,
    Polarization, ReferencePlane, ResamplingMethod, SpeckleFilter, SubSwath, Workflow,
};

const WGS84_WKT: &str = "GEOGCS[\"WGS 84\", DATUM[\"WGS_1984\", SPHEROID[\"WGS 84\",6378137,298.257223563, AUTHORITY[\"EPSG\",\"7030\"]],AUTHORITY[\"EPSG\",\"6326\"]], PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"4326\"]]";

/// Which polarizations to process.
///
/// `Full` takes whatever the scene offers, `Single` must be present in the
/// scene, `List` is filtered down to the available channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolarizationSelection {
    #[default]
    Full,
    Single(Polarization),
    List(Vec<Polarization>),
}

/// Processing parameters suitable for config files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    /// Pixel spacing in metres per workflow
    pub resolution_int: f64,
    pub resolution_coh: f64,
    pub resolution_ha: f64,
    pub target_epsg: u32,
    pub output_format: OutputFormat,
    pub polarizations: PolarizationSelection,
    pub subswaths: Vec<SubSwath>,
    pub external_dem: bool,
    pub external_dem_file: Option<PathBuf>,
    pub external_dem_no_data: f64,
    pub external_dem_egm: bool,
    /// Mask DEM no-data areas (sea) in the output
    pub mask_no_data: bool,
    pub img_resampling: ResamplingMethod,
    pub dem_resampling: ResamplingMethod,
    /// DEM resampling of back-geocoding (COH)
    pub bgc_dem_resampling: ResamplingMethod,
    /// DEM and image resampling of terrain correction (COH)
    pub tc_dem_resampling: ResamplingMethod,
    pub speckle_filter: SpeckleFilter,
    pub filter_size_x: u32,
    pub filter_size_y: u32,
    pub ml_range_looks: u32,
    pub ml_azimuth_looks: u32,
    pub coh_window_range: u32,
    pub coh_window_azimuth: u32,
    pub decomposition_features: Vec<DecompositionFeature>,
    pub decomposition_window: u32,
    pub ha_speckle_filter: PolarimetricFilter,
    pub reference_plane: ReferencePlane,
    pub linear_to_db: bool,
    pub orbit_type: OrbitType,
    /// Keep going when no orbit file can be applied
    pub continue_on_orbit_failure: bool,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            resolution_int: 20.0,
            resolution_coh: 20.0,
            resolution_ha: 20.0,
            target_epsg: 4326,
            output_format: OutputFormat::GeoTIFF,
            polarizations: PolarizationSelection::Full,
            subswaths: SubSwath::ALL.to_vec(),
            external_dem: false,
            external_dem_file: None,
            external_dem_no_data: -9999.0,
            external_dem_egm: true,
            mask_no_data: false,
            img_resampling: ResamplingMethod::BicubicInterpolation,
            dem_resampling: ResamplingMethod::BilinearInterpolation,
            bgc_dem_resampling: ResamplingMethod::BicubicInterpolation,
            tc_dem_resampling: ResamplingMethod::BilinearInterpolation,
            speckle_filter: SpeckleFilter::Boxcar,
            filter_size_x: 5,
            filter_size_y: 5,
            ml_range_looks: 4,
            ml_azimuth_looks: 1,
            coh_window_range: 11,
            coh_window_azimuth: 3,
            decomposition_features: DecompositionFeature::ALL.to_vec(),
            decomposition_window: 5,
            ha_speckle_filter: PolarimetricFilter::BoxCar,
            reference_plane: ReferencePlane::Gamma,
            linear_to_db: true,
            orbit_type: OrbitType::Precise,
            continue_on_orbit_failure: false,
        }
    }
}

impl ProcessingParams {
    pub fn resolution(&self, workflow: Workflow) -> f64 {
        match workflow {
            Workflow::Int => self.resolution_int,
            Workflow::Coh => self.resolution_coh,
            Workflow::Ha => self.resolution_ha,
        }
    }

    /// Map projection for terrain correction: WKT for 4326, `EPSG:<code>` otherwise.
    pub fn map_projection(&self) -> String {
        if self.target_epsg == 4326 {
            WGS84_WKT.to_string()
        } else {
            format!("EPSG:{}", self.target_epsg)
        }
    }

    pub fn dem_name(&self) -> &'static str {
        if self.external_dem {
            "External DEM"
        } else {
            "SRTM 1Sec HGT"
        }
    }

    /// DEM file handed to the engine; only set for an external DEM.
    pub fn dem_file(&self) -> Option<&Path> {
        if self.external_dem {
            self.external_dem_file.as_deref()
        } else {
            None
        }
    }
}

/// How the external engine is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `gpt` executable
    pub gpt: PathBuf,
    /// Extra arguments appended to every call, e.g. `["-c", "35G", "-q", "16"]`
    pub gpt_args: Vec<String>,
    /// Write graphs only, never run the engine
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gpt: PathBuf::from("gpt"),
            gpt_args: Vec::new(),
            dry_run: false,
        }
    }
}

/// Full planner configuration, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub data_dir: Option<PathBuf>,
    /// `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`, inclusive
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub mode: AcquisitionMode,
    pub workflows: Vec<Workflow>,
    pub out_dir_int: PathBuf,
    pub out_dir_coh: PathBuf,
    pub out_dir_ha: PathBuf,
    pub tmp_dir: PathBuf,
    pub failure_log_dir: PathBuf,
    /// GeoJSON polygon restricting processing extent
    pub aoi: Option<PathBuf>,
    /// Largest gap, in days, between failed dates that still belong to one rescue run
    pub max_gap_days: i64,
    pub params: ProcessingParams,
    pub engine: EngineConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            min_date: None,
            max_date: None,
            mode: AcquisitionMode::IW,
            workflows: vec![Workflow::Int],
            out_dir_int: PathBuf::from("INT"),
            out_dir_coh: PathBuf::from("COH"),
            out_dir_ha: PathBuf::from("HA"),
            tmp_dir: PathBuf::from("tmp"),
            failure_log_dir: PathBuf::from("logs"),
            aoi: None,
            max_gap_days: 12,
            params: ProcessingParams::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("cannot read config {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn out_dir(&self, workflow: Workflow) -> &Path {
        match workflow {
            Workflow::Int => &self.out_dir_int,
            Workflow::Coh => &self.out_dir_coh,
            Workflow::Ha => &self.out_dir_ha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: PlannerConfig = serde_json::from_str(
            r#"{
                "workflows": ["int", "coh"],
                "out_dir_coh": "/out/coh",
                "params": {
                    "target_epsg": 32633,
                    "polarizations": {"list": ["VV"]},
                    "speckle_filter": "Refined Lee",
                    "img_resampling": "BISINC_5_POINT_INTERPOLATION"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.workflows, vec![Workflow::Int, Workflow::Coh]);
        assert_eq!(cfg.out_dir(Workflow::Coh), Path::new("/out/coh"));
        assert_eq!(cfg.out_dir(Workflow::Int), Path::new("INT"));
        assert_eq!(cfg.params.map_projection(), "EPSG:32633");
        assert_eq!(
            cfg.params.polarizations,
            PolarizationSelection::List(vec![Polarization::VV])
        );
        assert_eq!(cfg.params.speckle_filter, SpeckleFilter::RefinedLee);
        assert_eq!(
            cfg.params.img_resampling,
            ResamplingMethod::Bisinc5PointInterpolation
        );
        assert_eq!(cfg.params.coh_window_range, 11);
        assert_eq!(cfg.engine.gpt, PathBuf::from("gpt"));
    }

    #[test]
    fn unknown_resampling_method_is_rejected() {
        let res: std::result::Result<ProcessingParams, _> =
            serde_json::from_str(r#"{"dem_resampling": "LANCZOS"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn geographic_target_uses_wkt() {
        let params = ProcessingParams::default();
        assert!(params.map_projection().starts_with("GEOGCS[\"WGS 84\""));
        assert_eq!(params.dem_name(), "SRTM 1Sec HGT");
        assert!(params.dem_file().is_none());
    }

    #[test]
    fn full_keyword_selects_every_polarization() {
        let sel: PolarizationSelection = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(sel, PolarizationSelection::Full);
    }

    #[test]
    fn config_file_is_loaded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.json");
        std::fs::write(&path, r#"{"aoi": "field.geojson", "max_gap_days": 6}"#).unwrap();
        let cfg = PlannerConfig::load(&path).unwrap();
        assert_eq!(cfg.aoi, Some(PathBuf::from("field.geojson")));
        assert_eq!(cfg.max_gap_days, 6);
    }
}
