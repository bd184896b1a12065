//! Scene catalog: discovers Sentinel-1 SLC products below a data directory and
//! answers date-range / mode queries over their manifest snapshots.
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::io::safe::read_acquisition;
use crate::types::{Acquisition, AcquisitionMode};

static PRODUCT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S1[AB].*\.(zip|SAFE)$").expect("valid product regex"));

/// Inclusive acquisition time window plus mode filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneQuery {
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub mode: Option<AcquisitionMode>,
}

impl SceneQuery {
    /// Build from textual bounds. A bare date extends to the whole day.
    pub fn from_bounds(
        min_date: Option<&str>,
        max_date: Option<&str>,
        mode: Option<AcquisitionMode>,
    ) -> Result<Self> {
        Ok(Self {
            min_date: min_date.map(|s| parse_bound(s, false)).transpose()?,
            max_date: max_date.map(|s| parse_bound(s, true)).transpose()?,
            mode,
        })
    }

    pub fn matches(&self, scene: &Acquisition) -> bool {
        self.min_date.is_none_or(|min| scene.start >= min)
            && self.max_date.is_none_or(|max| scene.start <= max)
            && self.mode.is_none_or(|mode| scene.mode == mode)
    }
}

fn parse_bound(s: &str, end_of_day: bool) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            let time = if end_of_day {
                NaiveTime::from_hms_opt(23, 59, 59)
            } else {
                NaiveTime::from_hms_opt(0, 0, 0)
            };
            if let Some(time) = time {
                return Ok(date.and_time(time));
            }
        }
    }
    Err(Error::InvalidArgument {
        arg: "date",
        value: s.to_string(),
    })
}

/// Anything that can list acquisitions for a query
pub trait SceneCatalog {
    fn select(&self, query: &SceneQuery) -> Result<Vec<Acquisition>>;
}

impl SceneCatalog for [Acquisition] {
    fn select(&self, query: &SceneQuery) -> Result<Vec<Acquisition>> {
        let mut selected: Vec<Acquisition> =
            self.iter().filter(|s| query.matches(s)).cloned().collect();
        selected.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(selected)
    }
}

impl SceneCatalog for Vec<Acquisition> {
    fn select(&self, query: &SceneQuery) -> Result<Vec<Acquisition>> {
        self.as_slice().select(query)
    }
}

/// Catalog of the products found on disk
#[derive(Debug, Clone)]
pub struct ArchiveCatalog {
    root: PathBuf,
    scenes: Vec<Acquisition>,
}

impl ArchiveCatalog {
    /// Scan `root` recursively. Products whose manifest cannot be read are
    /// logged and left out.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut products = Vec::new();
        find_products(root, &mut products)?;
        products.sort();

        let mut scenes = Vec::new();
        for product in products {
            match read_acquisition(&product) {
                Ok(scene) => scenes.push(scene),
                Err(e) => warn!("Skipping {}: {}", product.display(), e),
            }
        }
        info!("Found {} scene(s) in {}", scenes.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            scenes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scenes(&self) -> &[Acquisition] {
        &self.scenes
    }
}

impl SceneCatalog for ArchiveCatalog {
    fn select(&self, query: &SceneQuery) -> Result<Vec<Acquisition>> {
        self.scenes.select(query)
    }
}

/// `S1A*/S1B*` zips and `.SAFE` directories; `.SAFE` contents are not descended into.
fn find_products(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if PRODUCT_NAME.is_match(&name) {
            out.push(path);
        } else if path.is_dir() {
            find_products(&path, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planning::testing::acquisition;
    use crate::io::safe::tests::manifest_xml;
    use std::fs;

    #[test]
    fn date_bounds_are_inclusive_and_whole_day() {
        let query = SceneQuery::from_bounds(Some("2021-05-03"), Some("2021-05-09"), None).unwrap();
        let scenes = vec![
            acquisition("S1A_EARLY", 117, "2021-05-02T23:59:59"),
            acquisition("S1A_FIRST", 117, "2021-05-03T00:00:00"),
            acquisition("S1A_LAST", 117, "2021-05-09T17:10:00"),
            acquisition("S1A_LATE", 117, "2021-05-10T05:27:40"),
        ];
        let ids: Vec<String> = scenes
            .select(&query)
            .unwrap()
            .iter()
            .map(|s| s.product_id())
            .collect();
        assert_eq!(ids, vec!["S1A_FIRST".to_string(), "S1A_LAST".to_string()]);
    }

    #[test]
    fn mode_filter_and_bad_bounds() {
        let query = SceneQuery::from_bounds(None, None, Some(AcquisitionMode::EW)).unwrap();
        let scenes = vec![acquisition("S1A_IW", 117, "2021-05-03T05:27:40")];
        assert!(scenes.select(&query).unwrap().is_empty());
        assert!(SceneQuery::from_bounds(Some("May 3rd"), None, None).is_err());
    }

    #[test]
    fn scan_finds_products_and_skips_unreadable_ones() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2021/05");
        let safe = nested.join("S1A_IW_SLC__1SDV_20210503T052740_20210503T052807_037728_047336_ABCD.SAFE");
        fs::create_dir_all(safe.join("annotation")).unwrap();
        fs::write(
            safe.join("manifest.safe"),
            manifest_xml("2021-05-03T05:27:40.000000", "ASCENDING", 117, &["VV", "VH"]),
        )
        .unwrap();
        // Not a product name.
        fs::write(dir.path().join("notes.zip"), b"").unwrap();
        // Product name, but no manifest.
        fs::create_dir_all(dir.path().join("S1B_BROKEN.SAFE")).unwrap();

        let catalog = ArchiveCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.scenes().len(), 1);
        let scene = &catalog.scenes()[0];
        assert_eq!(scene.relative_orbit, 117);
        assert_eq!(scene.path, safe);
        assert_eq!(catalog.select(&SceneQuery::default()).unwrap().len(), 1);
    }
}
