use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use validator_core::config::ValidatorConfig;
use validator_core::models::{DataFile, FileFormat, JobStatus, RowType};
use validator_jobserver::{FileSystemJobStorage, JobServer};
use validator_processor::{DefaultSourcePreparer, EvaluatorFactory, ParallelProcessingCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("datapack-validator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validates biodiversity data packages")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Tabular file or archive directory to validate")
                .required(true),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Input format")
                .value_parser(["tabular", "archive"])
                .default_value("tabular"),
        )
        .arg(
            Arg::new("delimiter")
                .long("delimiter")
                .value_name("CHAR")
                .help("Field delimiter of tabular content")
                .default_value("\t"),
        )
        .arg(
            Arg::new("no-headers")
                .long("no-headers")
                .help("The input has no header line")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("row-type")
                .long("row-type")
                .value_name("TYPE")
                .help("Record type of a tabular input")
                .value_parser(["occurrence", "taxon", "event"]),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("split-size")
                .long("split-size")
                .value_name("LINES")
                .help("Chunk size in lines, overrides the configuration")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .get_matches();

    let log_level = matches.get_one::<String>("log-level").map(String::as_str).unwrap_or("info");
    let log_format = matches.get_one::<String>("log-format").map(String::as_str).unwrap_or("pretty");
    init_logging(log_level, log_format)?;

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = ValidatorConfig::load(config_path.as_deref())
        .context("failed to load configuration")?;
    if let Some(split_size) = matches.get_one::<u64>("split-size") {
        config.file_split_size = *split_size;
    }

    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .context("FILE argument is required")?;
    let data_file = build_data_file(&file, &matches)?;

    info!(
        "validating {} ({} lines per chunk)",
        file.display(),
        config.file_split_size
    );

    let storage = Arc::new(FileSystemJobStorage::new(config.result_storage_dir.clone()));
    let coordinator = Arc::new(ParallelProcessingCoordinator::new(
        EvaluatorFactory::new(),
        Arc::new(DefaultSourcePreparer),
        &config,
    ));
    let server = JobServer::new(storage, coordinator, &config, None);

    let accepted = server.submit(data_file).await;
    info!(job_id = accepted.job_id, "job accepted");

    let terminal = loop {
        let status = server.status(accepted.job_id).await;
        if status.status.is_terminal() {
            break status;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&terminal).context("cannot render job status")?
    );

    match terminal.status {
        JobStatus::Finished => {
            if terminal.result.as_ref().is_some_and(|report| !report.valid) {
                bail!("validation finished with issues");
            }
            Ok(())
        }
        status => bail!("job ended as {status:?}"),
    }
}

fn build_data_file(file: &Path, matches: &clap::ArgMatches) -> Result<DataFile> {
    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("archive") => FileFormat::Archive,
        _ => FileFormat::Tabular,
    };
    let delimiter = matches
        .get_one::<String>("delimiter")
        .and_then(|value| value.as_bytes().first().copied())
        .unwrap_or(b'\t');
    let has_headers = !matches.get_flag("no-headers");

    let source_file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .context("input path has no file name")?;

    let mut data_file = DataFile::new(source_file_name, file, format, delimiter, has_headers);
    data_file.row_type = matches
        .get_one::<String>("row-type")
        .map(|value| match value.as_str() {
            "taxon" => RowType::Taxon,
            "event" => RowType::Event,
            _ => RowType::Occurrence,
        });
    Ok(data_file)
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("failed to initialize logging")?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()
                .context("failed to initialize logging")?;
        }
    }
    Ok(())
}
