use clap::Parser;
use std::path::PathBuf;

use sarplan::{AcquisitionMode, Polarization, SubSwath, Workflow};

#[derive(Parser)]
#[command(
    name = "sarplan",
    version,
    about = "Plan and run Sentinel-1 SLC processing jobs"
)]
pub struct CliArgs {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory scanned recursively for S1A/S1B products (.zip or .SAFE)
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// Workflow to plan (repeatable: int, coh, ha)
    #[arg(short, long = "workflow", value_enum)]
    pub workflows: Vec<Workflow>,

    /// Area of interest as a GeoJSON file
    #[arg(long)]
    pub aoi: Option<PathBuf>,

    /// Output root; each workflow writes to <output-dir>/<INT|COH|HA>
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for graphs and intermediate products
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Directory for the failure log
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Earliest acquisition (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS), inclusive
    #[arg(long)]
    pub mindate: Option<String>,

    /// Latest acquisition, inclusive
    #[arg(long)]
    pub maxdate: Option<String>,

    /// Acquisition mode filter
    #[arg(long, value_enum)]
    pub mode: Option<AcquisitionMode>,

    /// Polarizations to process (repeatable); default is every available one
    #[arg(short, long = "pol", value_enum)]
    pub polarizations: Vec<Polarization>,

    /// Sub-swaths to process (repeatable: iw1, iw2, iw3)
    #[arg(long = "subswath", value_enum)]
    pub subswaths: Vec<SubSwath>,

    /// Path to the `gpt` executable
    #[arg(long)]
    pub gpt: Option<PathBuf>,

    /// Write graphs without running the engine
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the work list and exit
    #[arg(long, default_value_t = false)]
    pub plan_only: bool,

    /// Re-plan only the dates recorded in the failure log
    #[arg(long, default_value_t = false)]
    pub retry_failed: bool,

    /// Largest day gap kept inside one rescue run
    #[arg(long)]
    pub max_gap_days: Option<i64>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
