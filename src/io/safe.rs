//! Access to Sentinel-1 SLC products, either unpacked `.SAFE` directories or
//! the `.zip` archives they are distributed as. Provides manifest parsing into
//! [`Acquisition`] records and lookup of per sub-swath annotation documents.
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Acquisition, AcquisitionMode, OrbitDirection, Polarization, SubSwath};

static ANNOTATION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"s1[ab]-(iw\d)-slc-(vv|vh|hh|hv)-.*\.xml$").expect("valid annotation regex")
});

/// Source of raw annotation documents, addressable by (scene, sub-swath, polarization)
pub trait AnnotationSource: Sync {
    fn annotation(
        &self,
        scene: &Acquisition,
        subswath: SubSwath,
        polarization: Polarization,
    ) -> Result<String>;
}

/// Reads annotation documents straight from the product on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeArchive;

impl AnnotationSource for SafeArchive {
    fn annotation(
        &self,
        scene: &Acquisition,
        subswath: SubSwath,
        polarization: Polarization,
    ) -> Result<String> {
        let entries = list_entries(&scene.path)?;
        let name = find_annotation(&entries, subswath, polarization).ok_or_else(|| {
            Error::Metadata(format!(
                "no {} {} annotation in {}",
                subswath,
                polarization,
                scene.path.display()
            ))
        })?;
        debug!("Reading annotation {}", name);
        read_entry(&scene.path, &name)
    }
}

/// Pick the annotation entry for a sub-swath and polarization, skipping the
/// calibration/noise annotations that share the naming pattern.
pub fn find_annotation(
    entries: &[String],
    subswath: SubSwath,
    polarization: Polarization,
) -> Option<String> {
    let iw = subswath.as_str().to_lowercase();
    let pol = polarization.as_str().to_lowercase();
    entries
        .iter()
        .filter(|e| !e.contains("calibration"))
        .find(|e| {
            ANNOTATION_NAME
                .captures(e)
                .map(|c| &c[1] == iw && &c[2] == pol)
                .unwrap_or(false)
        })
        .cloned()
}

/// Relative entry names of a product (`/`-separated, relative to the SAFE root
/// for directories, archive paths for zips).
pub fn list_entries(product: &Path) -> Result<Vec<String>> {
    if product.is_dir() {
        let mut entries = Vec::new();
        walk(product, product, &mut entries)?;
        entries.sort();
        Ok(entries)
    } else {
        let archive = zip::ZipArchive::new(File::open(product)?)?;
        let mut entries: Vec<String> = archive.file_names().map(str::to_string).collect();
        entries.sort();
        Ok(entries)
    }
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            out.push(parts.join("/"));
        }
    }
    Ok(())
}

/// Read one entry of a product as UTF-8 text.
pub fn read_entry(product: &Path, name: &str) -> Result<String> {
    let mut text = String::new();
    if product.is_dir() {
        text = fs::read_to_string(product.join(name))?;
    } else {
        let mut archive = zip::ZipArchive::new(File::open(product)?)?;
        let mut entry = archive.by_name(name)?;
        entry.read_to_string(&mut text)?;
    }
    Ok(text)
}

/// Read `manifest.safe` of a product and turn it into an [`Acquisition`].
pub fn read_acquisition(product: &Path) -> Result<Acquisition> {
    let entries = list_entries(product)?;
    let manifest = entries
        .iter()
        .filter(|e| e.ends_with("manifest.safe"))
        .min_by_key(|e| e.len())
        .ok_or_else(|| {
            Error::Metadata(format!("no manifest.safe in {}", product.display()))
        })?;
    let xml = read_entry(product, manifest)?;
    parse_manifest(&xml, product)
}

/// Parse the product-level fields of a `manifest.safe` document.
pub fn parse_manifest(xml: &str, product: &Path) -> Result<Acquisition> {
    let source_name = product.display().to_string();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut curr = String::new();
    let mut in_platform = false;
    let mut in_instrument = false;
    let mut in_acquisition_period = false;
    let mut in_orbit_reference = false;
    let mut in_product_info = false;

    let mut family: Option<String> = None;
    let mut number: Option<String> = None;
    let mut mode: Option<String> = None;
    let mut start: Option<String> = None;
    let mut absolute_orbit: Option<u32> = None;
    let mut relative_orbit: Option<u32> = None;
    let mut pass: Option<String> = None;
    let mut polarizations: Vec<Polarization> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match tag.as_str() {
                    "platform" => in_platform = true,
                    "instrument" if in_platform => in_instrument = true,
                    "acquisitionPeriod" => in_acquisition_period = true,
                    "orbitReference" => in_orbit_reference = true,
                    "standAloneProductInformation" => in_product_info = true,
                    _ => {}
                }
                curr = tag;
            }
            Event::End(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match tag.as_str() {
                    "platform" => in_platform = false,
                    "instrument" => in_instrument = false,
                    "acquisitionPeriod" => in_acquisition_period = false,
                    "orbitReference" => in_orbit_reference = false,
                    "standAloneProductInformation" => in_product_info = false,
                    _ => {}
                }
                curr.clear();
            }
            Event::Text(e) => {
                let txt = e.unescape()?;
                let txt = txt.trim();
                match curr.as_str() {
                    "familyName" if in_platform && !in_instrument && family.is_none() => {
                        family = Some(txt.to_string())
                    }
                    "number" if in_platform && !in_instrument && number.is_none() => {
                        number = Some(txt.to_string())
                    }
                    "mode" if in_instrument && mode.is_none() => mode = Some(txt.to_string()),
                    "startTime" if in_acquisition_period => start = Some(txt.to_string()),
                    "orbitNumber" if in_orbit_reference && absolute_orbit.is_none() => {
                        absolute_orbit = txt.parse().ok()
                    }
                    "relativeOrbitNumber" if in_orbit_reference && relative_orbit.is_none() => {
                        relative_orbit = txt.parse().ok()
                    }
                    "pass" if in_orbit_reference => pass = Some(txt.to_string()),
                    "transmitterReceiverPolarisation" if in_product_info => {
                        let pol: Polarization = txt.parse()?;
                        if !polarizations.contains(&pol) {
                            polarizations.push(pol);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let missing = |field: &str| Error::malformed(&source_name, format!("manifest lacks {field}"));

    let start = start.ok_or_else(|| missing("acquisitionPeriod/startTime"))?;
    let start = parse_start_time(&start)
        .ok_or_else(|| Error::malformed(&source_name, format!("invalid start time `{start}`")))?;
    let orbit_direction: OrbitDirection = pass.ok_or_else(|| missing("orbit pass"))?.parse()?;
    let relative_orbit = relative_orbit.ok_or_else(|| missing("relativeOrbitNumber"))?;
    let absolute_orbit = absolute_orbit.ok_or_else(|| missing("orbitNumber"))?;
    let mode: AcquisitionMode = mode.as_deref().unwrap_or("IW").parse()?;
    let sensor = sensor_name(family.as_deref(), number.as_deref(), product);

    Ok(Acquisition {
        path: product.to_path_buf(),
        sensor,
        orbit_direction,
        relative_orbit,
        absolute_orbit,
        start,
        polarizations,
        mode,
    })
}

fn parse_start_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// `SENTINEL-1` + `A` -> `S1A`; falls back to the product name prefix.
fn sensor_name(family: Option<&str>, number: Option<&str>, product: &Path) -> String {
    match (family, number) {
        (Some(family), Some(number)) if family.to_uppercase().starts_with("SENTINEL-") => {
            format!("S{}{}", &family["SENTINEL-".len()..], number)
        }
        _ => {
            let id = crate::types::product_id_of(product);
            id.split('_').next().unwrap_or("S1").to_string()
        }
    }
}
