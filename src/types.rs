//! Shared types and enums used across SARPLAN.
//! Includes the `Acquisition` record, `Polarization`, `OrbitDirection`, `SubSwath`,
//! `Workflow`, and the closed sets of engine operator options (resampling methods,
//! speckle filters, decomposition features, output formats).
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize,
)]
pub enum Polarization {
    #[serde(alias = "vv")]
    VV,
    #[serde(alias = "vh")]
    VH,
    #[serde(alias = "hh")]
    HH,
    #[serde(alias = "hv")]
    HV,
}

impl Polarization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarization::VV => "VV",
            Polarization::VH => "VH",
            Polarization::HH => "HH",
            Polarization::HV => "HV",
        }
    }
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Polarization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HH" => Ok(Polarization::HH),
            "HV" => Ok(Polarization::HV),
            _ => Err(Error::InvalidArgument {
                arg: "polarization",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum OrbitDirection {
    Ascending,
    Descending,
}

impl OrbitDirection {
    /// Single-letter code used in product names.
    pub fn code(&self) -> char {
        match self {
            OrbitDirection::Ascending => 'A',
            OrbitDirection::Descending => 'D',
        }
    }
}

impl std::fmt::Display for OrbitDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbitDirection::Ascending => write!(f, "ASCENDING"),
            OrbitDirection::Descending => write!(f, "DESCENDING"),
        }
    }
}

impl FromStr for OrbitDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASCENDING" | "A" => Ok(OrbitDirection::Ascending),
            "DESCENDING" | "D" => Ok(OrbitDirection::Descending),
            _ => Err(Error::InvalidArgument {
                arg: "pass",
                value: s.to_string(),
            }),
        }
    }
}

/// Sub-swath of an IW acquisition
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize,
)]
pub enum SubSwath {
    #[serde(alias = "iw1")]
    IW1,
    #[serde(alias = "iw2")]
    IW2,
    #[serde(alias = "iw3")]
    IW3,
}

impl SubSwath {
    pub const ALL: [SubSwath; 3] = [SubSwath::IW1, SubSwath::IW2, SubSwath::IW3];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubSwath::IW1 => "IW1",
            SubSwath::IW2 => "IW2",
            SubSwath::IW3 => "IW3",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            SubSwath::IW1 => 1,
            SubSwath::IW2 => 2,
            SubSwath::IW3 => 3,
        }
    }
}

impl std::fmt::Display for SubSwath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubSwath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IW1" => Ok(SubSwath::IW1),
            "IW2" => Ok(SubSwath::IW2),
            "IW3" => Ok(SubSwath::IW3),
            _ => Err(Error::InvalidArgument {
                arg: "subswath",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize,
)]
pub enum AcquisitionMode {
    IW,
    EW,
    SM,
    WV,
}

impl FromStr for AcquisitionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IW" => Ok(AcquisitionMode::IW),
            "EW" => Ok(AcquisitionMode::EW),
            "SM" | "S1" | "S2" | "S3" | "S4" | "S5" | "S6" => Ok(AcquisitionMode::SM),
            "WV" => Ok(AcquisitionMode::WV),
            _ => Err(Error::InvalidArgument {
                arg: "mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Product family planned for a scene set
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    /// Calibrated, terrain-corrected backscatter intensity per date
    Int,
    /// Interferometric coherence per consecutive date pair
    Coh,
    /// Dual-pol H/A/Alpha decomposition per date
    Ha,
}

impl Workflow {
    pub fn label(&self) -> &'static str {
        match self {
            Workflow::Int => "INT",
            Workflow::Coh => "COH",
            Workflow::Ha => "HA",
        }
    }
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ResamplingMethod {
    #[serde(rename = "NEAREST_NEIGHBOUR")]
    NearestNeighbour,
    #[serde(rename = "BILINEAR_INTERPOLATION")]
    BilinearInterpolation,
    #[serde(rename = "CUBIC_CONVOLUTION")]
    CubicConvolution,
    #[serde(rename = "BISINC_5_POINT_INTERPOLATION")]
    Bisinc5PointInterpolation,
    #[serde(rename = "BISINC_11_POINT_INTERPOLATION")]
    Bisinc11PointInterpolation,
    #[serde(rename = "BISINC_21_POINT_INTERPOLATION")]
    Bisinc21PointInterpolation,
    #[serde(rename = "BICUBIC_INTERPOLATION")]
    BicubicInterpolation,
}

impl ResamplingMethod {
    pub fn snap_name(&self) -> &'static str {
        match self {
            ResamplingMethod::NearestNeighbour => "NEAREST_NEIGHBOUR",
            ResamplingMethod::BilinearInterpolation => "BILINEAR_INTERPOLATION",
            ResamplingMethod::CubicConvolution => "CUBIC_CONVOLUTION",
            ResamplingMethod::Bisinc5PointInterpolation => "BISINC_5_POINT_INTERPOLATION",
            ResamplingMethod::Bisinc11PointInterpolation => "BISINC_11_POINT_INTERPOLATION",
            ResamplingMethod::Bisinc21PointInterpolation => "BISINC_21_POINT_INTERPOLATION",
            ResamplingMethod::BicubicInterpolation => "BICUBIC_INTERPOLATION",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SpeckleFilter {
    Boxcar,
    Median,
    Frost,
    #[serde(rename = "Gamma Map")]
    GammaMap,
    #[serde(rename = "Refined Lee")]
    RefinedLee,
    Lee,
    #[serde(rename = "Lee Sigma")]
    LeeSigma,
}

impl SpeckleFilter {
    pub fn snap_name(&self) -> &'static str {
        match self {
            SpeckleFilter::Boxcar => "Boxcar",
            SpeckleFilter::Median => "Median",
            SpeckleFilter::Frost => "Frost",
            SpeckleFilter::GammaMap => "Gamma Map",
            SpeckleFilter::RefinedLee => "Refined Lee",
            SpeckleFilter::Lee => "Lee",
            SpeckleFilter::LeeSigma => "Lee Sigma",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PolarimetricFilter {
    #[serde(rename = "Box Car Filter")]
    BoxCar,
    #[serde(rename = "IDAN Filter")]
    Idan,
    #[serde(rename = "Refined Lee Filter")]
    RefinedLee,
    #[serde(rename = "Improved Lee Sigma Filter")]
    ImprovedLeeSigma,
}

impl PolarimetricFilter {
    pub fn snap_name(&self) -> &'static str {
        match self {
            PolarimetricFilter::BoxCar => "Box Car Filter",
            PolarimetricFilter::Idan => "IDAN Filter",
            PolarimetricFilter::RefinedLee => "Refined Lee Filter",
            PolarimetricFilter::ImprovedLeeSigma => "Improved Lee Sigma Filter",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum DecompositionFeature {
    Alpha,
    Entropy,
    Anisotropy,
}

impl DecompositionFeature {
    pub const ALL: [DecompositionFeature; 3] = [
        DecompositionFeature::Alpha,
        DecompositionFeature::Entropy,
        DecompositionFeature::Anisotropy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecompositionFeature::Alpha => "Alpha",
            DecompositionFeature::Entropy => "Entropy",
            DecompositionFeature::Anisotropy => "Anisotropy",
        }
    }
}

/// Radiometric reference plane of the INT product
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePlane {
    Gamma,
    Sigma,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OrbitType {
    Precise,
    Restituted,
}

impl OrbitType {
    pub fn snap_name(&self) -> &'static str {
        match self {
            OrbitType::Precise => "Sentinel Precise (Auto Download)",
            OrbitType::Restituted => "Sentinel Restituted (Auto Download)",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    GeoTIFF,
    #[serde(rename = "BEAM-DIMAP")]
    BeamDimap,
}

impl OutputFormat {
    pub fn snap_name(&self) -> &'static str {
        match self {
            OutputFormat::GeoTIFF => "GeoTIFF",
            OutputFormat::BeamDimap => "BEAM-DIMAP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::GeoTIFF => "tif",
            OutputFormat::BeamDimap => "dim",
        }
    }
}

/// One radar scene as reported by the catalog. Immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub path: PathBuf,
    /// Platform identifier, e.g. `S1A`
    pub sensor: String,
    pub orbit_direction: OrbitDirection,
    pub relative_orbit: u32,
    pub absolute_orbit: u32,
    pub start: NaiveDateTime,
    pub polarizations: Vec<Polarization>,
    pub mode: AcquisitionMode,
}

impl Acquisition {
    /// Calendar date of the acquisition start.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Start time in the compact `YYYYMMDDTHHMMSS` form used in product names.
    pub fn compact_start(&self) -> String {
        self.start.format("%Y%m%dT%H%M%S").to_string()
    }

    /// Product identifier: file name without `.zip` / `.SAFE`.
    pub fn product_id(&self) -> String {
        product_id_of(&self.path)
    }

    /// Trailing 4-character unique identifier of the product name.
    pub fn product_uid(&self) -> String {
        let id = self.product_id();
        let chars: Vec<char> = id.chars().collect();
        let from = chars.len().saturating_sub(4);
        chars[from..].iter().collect()
    }

    pub fn has_polarization(&self, pol: Polarization) -> bool {
        self.polarizations.contains(&pol)
    }
}

pub(crate) fn product_id_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut id = name.as_str();
    for suffix in [".zip", ".SAFE", ".safe"] {
        if let Some(stripped) = id.strip_suffix(suffix) {
            id = stripped;
        }
    }
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_uid_is_last_four_characters_of_the_product_id() {
        let acq = Acquisition {
            path: PathBuf::from(
                "/data/S1B_IW_SLC__1SDV_20201229T170010_20201229T170037_024920_02F722_8B6C.zip",
            ),
            sensor: "S1B".into(),
            orbit_direction: OrbitDirection::Ascending,
            relative_orbit: 117,
            absolute_orbit: 24920,
            start: NaiveDate::from_ymd_opt(2020, 12, 29)
                .unwrap()
                .and_hms_opt(17, 0, 10)
                .unwrap(),
            polarizations: vec![Polarization::VV, Polarization::VH],
            mode: AcquisitionMode::IW,
        };
        assert_eq!(
            acq.product_id(),
            "S1B_IW_SLC__1SDV_20201229T170010_20201229T170037_024920_02F722_8B6C"
        );
        assert_eq!(acq.product_uid(), "8B6C");
        assert_eq!(acq.compact_start(), "20201229T170010");
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("vh".parse::<Polarization>().unwrap(), Polarization::VH);
        assert_eq!("iw3".parse::<SubSwath>().unwrap(), SubSwath::IW3);
        assert_eq!(
            "DESCENDING".parse::<OrbitDirection>().unwrap(),
            OrbitDirection::Descending
        );
        assert!("XX".parse::<Polarization>().is_err());
    }
}
