//! Output identities and the existence check that makes re-runs incremental.
//!
//! Every leaf output (one polarization, one decomposition feature) has its own
//! [`OutputMarker`]. A unit is re-planned only for the leaves whose file is
//! missing under the ledger root.
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::core::planning::grouping::DateGroup;
use crate::core::planning::pairing::ProcessingPair;

/// Deterministic identity of one expected output file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputMarker {
    /// Product folder name, e.g. `S1A_A_relOrb_117_INT_20210503T052740_Orb_Cal_Deb_ML_TF_Spk_TC`
    pub product: String,
    /// Polarization or feature name
    pub leaf: String,
    /// AOI name; AOI products live one level deeper
    pub aoi: Option<String>,
    pub extension: String,
}

impl OutputMarker {
    pub fn new(product: String, leaf: impl Into<String>, aoi: Option<&str>, extension: &str) -> Self {
        Self {
            product,
            leaf: leaf.into(),
            aoi: aoi.map(str::to_string),
            extension: extension.to_string(),
        }
    }

    /// Product folder relative to the output root.
    pub fn product_dir(&self) -> PathBuf {
        match &self.aoi {
            Some(aoi) => Path::new(aoi).join(&self.product),
            None => PathBuf::from(&self.product),
        }
    }

    /// Canonical path fragment: `[aoi/]product/leaf.ext`.
    pub fn relative_path(&self) -> PathBuf {
        self.product_dir()
            .join(format!("{}.{}", self.leaf, self.extension))
    }
}

impl std::fmt::Display for OutputMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

pub fn int_product_name(group: &DateGroup) -> String {
    let first = group.first();
    format!(
        "{}_{}_relOrb_{}_INT_{}_Orb_Cal_Deb_ML_TF_Spk_TC",
        first.sensor,
        first.orbit_direction.code(),
        first.relative_orbit,
        first.compact_start()
    )
}

pub fn coh_product_name(pair: &ProcessingPair) -> String {
    let (a, b) = (pair.earlier.first(), pair.later.first());
    format!(
        "S1_{}_relOrb_{}_COH_{}_{}_{}{}",
        a.orbit_direction.code(),
        a.relative_orbit,
        a.compact_start(),
        b.compact_start(),
        a.product_uid(),
        b.product_uid()
    )
}

pub fn ha_product_name(group: &DateGroup) -> String {
    let first = group.first();
    format!(
        "{}_{}_relOrb_{}_HA_{}",
        first.sensor,
        first.orbit_direction.code(),
        first.relative_orbit,
        first.compact_start()
    )
}

/// Existence checks against one output root
#[derive(Debug, Clone)]
pub struct OutputLedger {
    root: PathBuf,
}

impl OutputLedger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, marker: &OutputMarker) -> PathBuf {
        self.root.join(marker.relative_path())
    }

    pub fn is_complete(&self, marker: &OutputMarker) -> bool {
        self.path_of(marker).is_file()
    }

    /// Markers whose output is still missing, in input order.
    pub fn pending<I>(&self, markers: I) -> Vec<OutputMarker>
    where
        I: IntoIterator<Item = OutputMarker>,
    {
        markers
            .into_iter()
            .filter(|m| {
                let done = self.is_complete(m);
                if done {
                    debug!("Output exists, skipping {}", m);
                }
                !done
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planning::testing::acquisition;
    use std::fs;

    fn group() -> DateGroup {
        let scene = acquisition(
            "S1A_IW_SLC__1SDV_20210503T052740_20210503T052807_037728_047336_ABCD",
            117,
            "2021-05-03T05:27:40",
        );
        DateGroup::new(scene.date(), vec![scene]).unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"raster").unwrap();
    }

    #[test]
    fn product_names_follow_the_workflow_patterns() {
        let g = group();
        assert_eq!(
            int_product_name(&g),
            "S1A_A_relOrb_117_INT_20210503T052740_Orb_Cal_Deb_ML_TF_Spk_TC"
        );
        assert_eq!(ha_product_name(&g), "S1A_A_relOrb_117_HA_20210503T052740");

        let later_scene = acquisition("S1A_IW_SLC__1SDV_LATER_EF01", 117, "2021-05-09T05:27:41");
        let later = DateGroup::new(later_scene.date(), vec![later_scene]).unwrap();
        let pair = ProcessingPair { earlier: g, later };
        assert_eq!(
            coh_product_name(&pair),
            "S1_A_relOrb_117_COH_20210503T052740_20210509T052741_ABCDEF01"
        );
    }

    #[test]
    fn aoi_markers_nest_below_the_aoi_name() {
        let plain = OutputMarker::new("P".into(), "VV", None, "tif");
        assert_eq!(plain.relative_path(), PathBuf::from("P/VV.tif"));
        let nested = OutputMarker::new("P".into(), "Alpha", Some("lake"), "tif");
        assert_eq!(nested.relative_path(), PathBuf::from("lake/P/Alpha.tif"));
    }

    #[test]
    fn second_pass_over_a_populated_tree_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OutputLedger::new(dir.path());
        let product = int_product_name(&group());
        let markers = vec![
            OutputMarker::new(product.clone(), "VV", None, "tif"),
            OutputMarker::new(product, "VH", None, "tif"),
        ];

        let first = ledger.pending(markers.clone());
        assert_eq!(first.len(), 2);
        for m in &first {
            touch(&ledger.path_of(m));
        }
        assert!(ledger.pending(markers).is_empty());
    }

    #[test]
    fn deleting_one_leaf_readmits_only_that_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OutputLedger::new(dir.path());
        let product = int_product_name(&group());
        let vv = OutputMarker::new(product.clone(), "VV", None, "tif");
        let vh = OutputMarker::new(product, "VH", None, "tif");
        touch(&ledger.path_of(&vv));
        touch(&ledger.path_of(&vh));

        fs::remove_file(ledger.path_of(&vh)).unwrap();
        assert_eq!(ledger.pending(vec![vv.clone(), vh.clone()]), vec![vh]);
        assert!(ledger.is_complete(&vv));
    }

    #[test]
    fn directory_with_the_leaf_name_is_not_complete() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OutputLedger::new(dir.path());
        let marker = OutputMarker::new("P".into(), "VV", None, "tif");
        fs::create_dir_all(ledger.path_of(&marker)).unwrap();
        assert!(!ledger.is_complete(&marker));
    }
}
