use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use youtube_extractor::config::parse_language_list;
use youtube_extractor::export::{export_filename, write_export, CsvLayout, ExportFormat};
use youtube_extractor::import::read_url_file;
use youtube_extractor::{Config, VideoExtractor};

fn cli() -> Command {
    Command::new("youtube-extractor")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Extract YouTube metadata, transcripts, subtitle URLs and comments")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (TOML)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(Arg::new("host").long("host").value_name("HOST").help("Listen address"))
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Listen port")
                        .value_parser(clap::value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("batch")
                .about("Extract every URL listed in a CSV file and save the results")
                .arg(
                    Arg::new("csv")
                        .value_name("CSV")
                        .help("CSV file whose first column holds URLs or video ids")
                        .required(true),
                )
                .arg(
                    Arg::new("languages")
                        .short('l')
                        .long("languages")
                        .value_name("LANGS")
                        .help("Comma-separated transcript languages in preference order"),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format: json or csv")
                        .default_value("json"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Output file (defaults to a timestamped name)"),
                ),
        )
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.output.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("youtube_extractor={},warn", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    init_logging(&config, matches.get_flag("verbose"));
    config.validate()?;
    debug!("{}", config.summary());

    match matches.subcommand() {
        Some(("serve", args)) => serve(config, args).await,
        Some(("batch", args)) => batch(config, args).await,
        _ => Err(anyhow!("unknown command")),
    }
}

#[cfg(feature = "api")]
async fn serve(mut config: Config, args: &ArgMatches) -> Result<()> {
    use youtube_extractor::api::ApiServer;

    if let Some(host) = args.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = args.get_one::<u16>("port") {
        config.server.port = *port;
    }

    info!("🚀 YouTube Extractor v{} starting...", env!("CARGO_PKG_VERSION"));
    if config.cookies_file().is_none() {
        info!("No cookie file configured; set YOUTUBE_COOKIES_FILE if YouTube blocks requests");
    }

    let extractor = Arc::new(VideoExtractor::from_config(&config)?);
    ApiServer::new(extractor, Arc::new(config)).start().await
}

#[cfg(not(feature = "api"))]
async fn serve(_config: Config, _args: &ArgMatches) -> Result<()> {
    Err(anyhow!("this build does not include the HTTP API (enable the `api` feature)"))
}

async fn batch(config: Config, args: &ArgMatches) -> Result<()> {
    let csv_path = args
        .get_one::<String>("csv")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("CSV path is required"))?;
    let format: ExportFormat = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("json")
        .parse()?;
    let languages = args
        .get_one::<String>("languages")
        .map(|l| parse_language_list(l))
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| config.youtube.default_languages.clone());
    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export_filename(format, &chrono::Local::now())));

    let mut urls = read_url_file(&csv_path)?;
    if urls.is_empty() {
        return Err(anyhow!("no valid YouTube URL found in {}", csv_path.display()));
    }
    let limit = config.server.max_csv_batch_size;
    if urls.len() > limit {
        warn!("{} URLs found, only the first {} are processed", urls.len(), limit);
        urls.truncate(limit);
    }

    info!("🌐 Languages: {}", languages.join(", "));
    let extractor = VideoExtractor::from_config(&config)?;

    let start_time = std::time::Instant::now();
    let records = extractor.extract_batch(&urls, &languages).await;
    let duration = start_time.elapsed();

    write_export(
        &output,
        &records,
        format,
        CsvLayout::Full,
        config.output.csv_preview_chars,
    )?;

    let successful = records.iter().filter(|r| r.is_success()).count();
    info!("🎉 Processing completed in {:.2}s", duration.as_secs_f64());
    info!("✅ Successful: {}", successful);
    info!("❌ Failed: {}", records.len() - successful);
    println!("{}", output.display());

    Ok(())
}
