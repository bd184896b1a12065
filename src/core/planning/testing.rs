//! Fixtures shared by the planning unit tests.
use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::io::safe::AnnotationSource;
use crate::types::{Acquisition, AcquisitionMode, OrbitDirection, Polarization, SubSwath};

/// Ascending S1A dual-pol IW scene at `{name}.zip`.
pub(crate) fn acquisition(name: &str, relative_orbit: u32, start: &str) -> Acquisition {
    Acquisition {
        path: PathBuf::from(format!("{name}.zip")),
        sensor: "S1A".to_string(),
        orbit_direction: OrbitDirection::Ascending,
        relative_orbit,
        absolute_orbit: 37000 + relative_orbit,
        start: NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S").unwrap(),
        polarizations: vec![Polarization::VV, Polarization::VH],
        mode: AcquisitionMode::IW,
    }
}

#[derive(Default)]
pub(crate) struct InMemoryAnnotations {
    docs: HashMap<(PathBuf, SubSwath, Polarization), String>,
}

impl InMemoryAnnotations {
    pub(crate) fn insert(
        &mut self,
        scene: &Acquisition,
        subswath: SubSwath,
        polarization: Polarization,
        xml: String,
    ) {
        self.docs
            .insert((scene.path.clone(), subswath, polarization), xml);
    }
}

impl AnnotationSource for InMemoryAnnotations {
    fn annotation(
        &self,
        scene: &Acquisition,
        subswath: SubSwath,
        polarization: Polarization,
    ) -> Result<String> {
        self.docs
            .get(&(scene.path.clone(), subswath, polarization))
            .cloned()
            .ok_or_else(|| Error::Metadata(format!("no annotation for {subswath} {polarization}")))
    }
}
