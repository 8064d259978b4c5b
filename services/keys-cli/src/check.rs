use crate::settings::{discover_user_data, load_config, DataArgs};
use clap::Args;
use flood_keys::error::AppError;
use flood_keys::reference::ReferenceTables;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) data: DataArgs,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    data_dir: PathBuf,
    postcodes: usize,
    year_built_categories: usize,
    mcm_residential_rules: usize,
    mcm_nonresidential_rules: usize,
    vulnerabilities: usize,
    at_risk_cells: usize,
    raster_width: u32,
    raster_height: u32,
    override_files: Vec<String>,
}

pub(crate) fn run_check(mut args: CheckArgs) -> Result<(), AppError> {
    let config = load_config(&mut args.data)?;
    let user_data = discover_user_data(&config.keys)?;
    let tables = ReferenceTables::load(&config.keys.data_dir)?;
    let (raster_width, raster_height) = tables.catchments.dimensions();

    let report = CheckReport {
        data_dir: config.keys.data_dir,
        postcodes: tables.postcodes.len(),
        year_built_categories: tables.year_built.len(),
        mcm_residential_rules: tables.mcm_residential.len(),
        mcm_nonresidential_rules: tables.mcm_nonresidential.len(),
        vulnerabilities: tables.vulnerability.len(),
        at_risk_cells: tables.at_risk.len(),
        raster_width,
        raster_height,
        override_files: user_data.file_names(),
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Reference data in {}", report.data_dir.display());
    println!("- {} postcode centroids", report.postcodes);
    println!("- {} year built categories", report.year_built_categories);
    println!(
        "- {} residential / {} non-residential MCM rules",
        report.mcm_residential_rules, report.mcm_nonresidential_rules
    );
    println!("- {} vulnerability rows", report.vulnerabilities);
    println!("- {} at-risk cells", report.at_risk_cells);
    println!(
        "- catchment raster {} x {}",
        report.raster_width, report.raster_height
    );
    if report.override_files.is_empty() {
        println!("- no user data overrides");
    } else {
        println!("- user data overrides: {}", report.override_files.join(", "));
    }
    Ok(())
}
