use tracing::info;
use tracing_subscriber::EnvFilter;

use sarplan::api::{self, BatchReport};
use sarplan::core::params::{PlannerConfig, PolarizationSelection};
use sarplan::core::planning::Plan;
use sarplan::io::FailureLog;
use sarplan::Workflow;

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Config file (or defaults) with the command-line overrides applied.
pub fn resolve_config(args: &CliArgs) -> Result<PlannerConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };

    if let Some(dir) = &args.input_dir {
        config.data_dir = Some(dir.clone());
    }
    if !args.workflows.is_empty() {
        config.workflows = args.workflows.clone();
    }
    if let Some(aoi) = &args.aoi {
        config.aoi = Some(aoi.clone());
    }
    if let Some(root) = &args.output_dir {
        config.out_dir_int = root.join(Workflow::Int.label());
        config.out_dir_coh = root.join(Workflow::Coh.label());
        config.out_dir_ha = root.join(Workflow::Ha.label());
    }
    if let Some(tmp) = &args.tmp_dir {
        config.tmp_dir = tmp.clone();
    }
    if let Some(logs) = &args.log_dir {
        config.failure_log_dir = logs.clone();
    }
    if args.mindate.is_some() {
        config.min_date = args.mindate.clone();
    }
    if args.maxdate.is_some() {
        config.max_date = args.maxdate.clone();
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    match args.polarizations.as_slice() {
        [] => {}
        [single] => config.params.polarizations = PolarizationSelection::Single(*single),
        many => config.params.polarizations = PolarizationSelection::List(many.to_vec()),
    }
    if !args.subswaths.is_empty() {
        config.params.subswaths = args.subswaths.clone();
    }
    if let Some(gpt) = &args.gpt {
        config.engine.gpt = gpt.clone();
    }
    if args.dry_run {
        config.engine.dry_run = true;
    }
    if let Some(days) = args.max_gap_days {
        config.max_gap_days = days;
    }

    if config.data_dir.is_none() {
        return Err(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        });
    }
    if config.workflows.is_empty() {
        return Err(AppError::NoWorkflow);
    }
    Ok(config)
}

fn print_plan(plan: &Plan) {
    for request in &plan.requests {
        println!(
            "{:<4} {} <- {} scene(s) -> {}",
            request.workflow.label(),
            request.unit_name(),
            request.scenes().count(),
            request.output.display()
        );
    }
    for marker in &plan.skipped {
        println!("done {marker}");
    }
    for rejection in &plan.rejected {
        println!("skip {} {}: {}", rejection.workflow, rejection.unit, rejection.error);
    }
}

fn print_report(report: &BatchReport) {
    println!("Processed:  {}", report.processed);
    println!("Skipped:    {}", report.skipped);
    println!("No overlap: {}", report.no_overlap);
    println!("Invalid:    {}", report.invalid);
    println!("Errors:     {}", report.errors);
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);
    let config = resolve_config(&args)?;
    info!(
        "Planning {:?} from {:?}",
        config.workflows, config.data_dir
    );

    if args.plan_only {
        let plan = api::plan_directory(&config).map_err(AppError::from)?;
        print_plan(&plan);
        return Ok(());
    }

    let report = api::run(&config, args.retry_failed).map_err(AppError::from)?;
    print_report(&report);
    if report.errors > 0 {
        let log = FailureLog::in_dir(&config.failure_log_dir);
        return Err(AppError::UnitsFailed {
            failed: report.errors,
            log: log.path().display().to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sarplan::{Polarization, SubSwath};
    use std::path::PathBuf;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("sarplan").chain(argv.iter().copied()))
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--input-dir", "/data",
            "-w", "int",
            "-w", "coh",
            "--output-dir", "/out",
            "--pol", "vv",
            "--subswath", "iw2",
            "--dry-run",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/data")));
        assert_eq!(config.workflows, vec![Workflow::Int, Workflow::Coh]);
        assert_eq!(config.out_dir_coh, PathBuf::from("/out/COH"));
        assert_eq!(
            config.params.polarizations,
            PolarizationSelection::Single(Polarization::VV)
        );
        assert_eq!(config.params.subswaths, vec![SubSwath::IW2]);
        assert!(config.engine.dry_run);
    }

    #[test]
    fn input_dir_is_required() {
        let err = resolve_config(&parse(&["-w", "int"])).unwrap_err();
        assert!(matches!(err, AppError::MissingArgument { .. }));
    }
}
