//! Synthetic Sentinel-1 SLC products for the integration tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const POINTS_PER_LINE: usize = 21;

/// One synthetic acquisition: start time `YYYYMMDDTHHMMSS` plus footprint origin.
pub struct Product<'a> {
    pub start: &'a str,
    pub pass: &'a str,
    pub relative_orbit: u32,
    pub pols: &'a [&'a str],
    pub uid: &'a str,
    /// Bursts per sub-swath
    pub bursts: usize,
    /// IW1 starts here, IW2/IW3 one degree further east each
    pub lon0: f64,
    pub lat0: f64,
}

impl Product<'_> {
    pub fn name(&self, extension: &str) -> String {
        format!(
            "S1A_IW_SLC__1SDV_{start}_{start}_037728_047336_{uid}.{extension}",
            start = self.start,
            uid = self.uid
        )
    }

    fn iso_start(&self) -> String {
        let s = self.start;
        format!(
            "{}-{}-{}T{}:{}:{}.000000",
            &s[0..4],
            &s[4..6],
            &s[6..8],
            &s[9..11],
            &s[11..13],
            &s[13..15]
        )
    }

    /// `(entry name, contents)` of every file the planner reads
    fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![(
            "manifest.safe".to_string(),
            manifest_xml(&self.iso_start(), self.pass, self.relative_orbit, self.pols),
        )];
        for (i, iw) in ["iw1", "iw2", "iw3"].iter().enumerate() {
            for pol in self.pols {
                let name = format!(
                    "annotation/s1a-{iw}-slc-{}-{}-{}-037728-047336-00{}.xml",
                    pol.to_lowercase(),
                    self.start.to_lowercase(),
                    self.start.to_lowercase(),
                    i + 1
                );
                let xml = annotation_xml(self.bursts, self.lon0 + i as f64, self.lat0);
                entries.push((name, xml));
            }
        }
        entries
    }

    /// Unpacked `.SAFE` directory below `dir`.
    pub fn write_safe(&self, dir: &Path) -> PathBuf {
        let root = dir.join(self.name("SAFE"));
        for (name, contents) in self.entries() {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        root
    }

    /// Zip archive below `dir`, entries nested in the `.SAFE` folder.
    pub fn write_zip(&self, dir: &Path) -> PathBuf {
        let path = dir.join(self.name("zip"));
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        let prefix = self.name("SAFE");
        for (name, contents) in self.entries() {
            zip.start_file(
                format!("{prefix}/{name}"),
                zip::write::FileOptions::default(),
            )
            .unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }
}

pub fn product(start: &'static str, uid: &'static str) -> Product<'static> {
    Product {
        start,
        pass: "ASCENDING",
        relative_orbit: 117,
        pols: &["VV", "VH"],
        uid,
        bursts: 3,
        lon0: 10.0,
        lat0: 50.0,
    }
}

/// Grid of `bursts + 1` lines; burst `b` spans latitudes `[lat0 + b - 1, lat0 + b]`
/// and the swath one degree of longitude from `lon0`.
pub fn annotation_xml(bursts: usize, lon0: f64, lat0: f64) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<product>\n");
    xml.push_str("<adsHeader><swath>IW</swath></adsHeader>\n<geolocationGrid>\n");
    xml.push_str(&format!(
        "<geolocationGridPointList count=\"{}\">\n",
        (bursts + 1) * POINTS_PER_LINE
    ));
    for line in 0..=bursts {
        for k in 0..POINTS_PER_LINE {
            xml.push_str(&format!(
                "<geolocationGridPoint><azimuthTime>2021-05-03T05:27:{:02}.000000</azimuthTime>\
                 <line>{}</line><pixel>{}</pixel><latitude>{}</latitude>\
                 <longitude>{}</longitude><height>0</height></geolocationGridPoint>\n",
                line,
                line * 1500,
                k * 1300,
                lat0 + line as f64,
                lon0 + k as f64 * 0.05
            ));
        }
    }
    xml.push_str("</geolocationGridPointList>\n</geolocationGrid>\n</product>\n");
    xml
}

pub fn manifest_xml(start: &str, pass: &str, relative_orbit: u32, pols: &[&str]) -> String {
    let pol_tags: String = pols
        .iter()
        .map(|p| {
            format!(
                "<s1sarl1:transmitterReceiverPolarisation>{p}</s1sarl1:transmitterReceiverPolarisation>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xfdu:XFDU xmlns:xfdu="urn:ccsds:schema:xfdu:1" xmlns:safe="http://www.esa.int/safe/sentinel-1.0" xmlns:s1="http://www.esa.int/safe/sentinel-1.0/sentinel-1" xmlns:s1sarl1="http://www.esa.int/safe/sentinel-1.0/sentinel-1/sar/level-1">
  <metadataSection>
    <metadataObject ID="platform"><metadataWrap><xmlData>
      <safe:platform>
        <safe:familyName>SENTINEL-1</safe:familyName>
        <safe:number>A</safe:number>
        <safe:instrument>
          <safe:familyName abbreviation="SAR">Synthetic Aperture Radar</safe:familyName>
          <safe:extension><s1sarl1:instrumentMode><s1sarl1:mode>IW</s1sarl1:mode></s1sarl1:instrumentMode></safe:extension>
        </safe:instrument>
      </safe:platform>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="acquisitionPeriod"><metadataWrap><xmlData>
      <safe:acquisitionPeriod>
        <safe:startTime>{start}</safe:startTime>
      </safe:acquisitionPeriod>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="measurementOrbitReference"><metadataWrap><xmlData>
      <safe:orbitReference>
        <safe:orbitNumber type="start">37728</safe:orbitNumber>
        <safe:relativeOrbitNumber type="start">{relative_orbit}</safe:relativeOrbitNumber>
        <safe:extension><s1:orbitProperties><s1:pass>{pass}</s1:pass></s1:orbitProperties></safe:extension>
      </safe:orbitReference>
    </xmlData></metadataWrap></metadataObject>
    <metadataObject ID="generalProductInformation"><metadataWrap><xmlData>
      <s1sarl1:standAloneProductInformation>
        {pol_tags}
      </s1sarl1:standAloneProductInformation>
    </xmlData></metadataWrap></metadataObject>
  </metadataSection>
</xfdu:XFDU>
"#
    )
}

/// GeoJSON polygon file for the lon/lat box, named `<name>.geojson`.
pub fn write_aoi(dir: &Path, name: &str, lon: (f64, f64), lat: (f64, f64)) -> PathBuf {
    let path = dir.join(format!("{name}.geojson"));
    let geojson = format!(
        r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}]}}"#,
        x0 = lon.0,
        x1 = lon.1,
        y0 = lat.0,
        y1 = lat.1
    );
    fs::write(&path, geojson).unwrap();
    path
}
