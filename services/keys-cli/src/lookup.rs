use crate::settings::{discover_user_data, load_config, DataArgs};
use clap::Args;
use flood_keys::error::AppError;
use flood_keys::keys_file::write_keys_files;
use flood_keys::lookup::{status_counts, KeysLookup, LocationReader};
use flood_keys::reference::ReferenceTables;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// OED location file
    pub(crate) locations: PathBuf,
    #[command(flatten)]
    pub(crate) data: DataArgs,
    /// Directory keys files are written to (overrides KEYS_OUTPUT_DIR)
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Locations per parallel work unit (overrides KEYS_CHUNK_SIZE)
    #[arg(long)]
    pub(crate) chunk_size: Option<usize>,
    /// Location column holding the user vulnerability id
    #[arg(long)]
    pub(crate) user_vulnerability_column: Option<String>,
    /// Print the run summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct LookupReport {
    locations: usize,
    keys: usize,
    successes: usize,
    errors: usize,
    model_files: usize,
    statuses: BTreeMap<&'static str, usize>,
    output_dir: PathBuf,
}

pub(crate) fn run_lookup(mut args: LookupArgs) -> Result<(), AppError> {
    let mut config = load_config(&mut args.data)?;
    if let Some(output_dir) = args.output_dir.take() {
        config.keys.output_dir = output_dir;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.keys.chunk_size = chunk_size;
    }
    if let Some(column) = args.user_vulnerability_column.take() {
        config.keys.user_vulnerability_column = column;
    }

    let user_data = discover_user_data(&config.keys)?;
    let tables = ReferenceTables::load(&config.keys.data_dir)?;
    let lookup = KeysLookup::new(tables)
        .with_user_vulnerability_column(config.keys.user_vulnerability_column.clone());

    let records = LocationReader::from_path(&args.locations)?;
    info!(
        ?config.environment,
        locations = records.len(),
        chunk_size = config.keys.chunk_size,
        overrides = ?user_data.file_names(),
        "starting keys lookup"
    );
    let keys = lookup.process_locations_parallel(&records, config.keys.chunk_size)?;

    let summary = write_keys_files(&config.keys.output_dir, &keys)?;

    let report = LookupReport {
        locations: records.len(),
        keys: keys.len(),
        successes: summary.successes,
        errors: summary.errors,
        model_files: summary.model_files,
        statuses: status_counts(&keys),
        output_dir: config.keys.output_dir,
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        println!("Keys lookup");
        println!(
            "- {} locations -> {} keys ({} successful, {} rejected)",
            report.locations, report.keys, report.successes, report.errors
        );
        for (status, count) in &report.statuses {
            println!("  - {status}: {count}");
        }
        println!(
            "- {} model data files listed in {}",
            report.model_files,
            report.output_dir.display()
        );
    }

    Ok(())
}
