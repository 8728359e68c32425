use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;
use std::process;
use ucam_routine::config::{self, Config};
use ucam_routine::output::DatasetWriter;
use ucam_routine::session::{PortalUrls, SessionCollector};
use ucam_routine::{combine_routine, parse_dashboard};

#[derive(Parser)]
#[command(name = "ucam-routine")]
#[command(about = "Fetches UCAM attendance dashboards and builds a combined class routine", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long,
        default_value = "configs_to_edit/ucam_login_credentials.json",
        help = "Path to the JSON credentials file"
    )]
    credentials: PathBuf,

    #[arg(
        short = 't',
        long,
        default_value = "configs_to_edit/teacher_contact_details.json",
        help = "Path to the JSON teacher contact lookup"
    )]
    teachers: PathBuf,

    #[arg(
        long,
        default_value = "output_of_fetched_routine",
        help = "Directory for the final combined routine"
    )]
    out_dir: PathBuf,

    #[arg(
        long,
        default_value = "tmp",
        help = "Directory for per-user artifacts and failure snapshots"
    )]
    tmp_dir: PathBuf,

    #[arg(long, help = "Run the browser with a visible window")]
    headed: bool,

    #[arg(long, help = "Path to a Chrome/Chromium binary to use")]
    browser_path: Option<String>,

    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let config = Config::load(&cli.credentials).unwrap_or_else(|e| {
        log::error!("failed to load {}: {e}", cli.credentials.display());
        process::exit(1);
    });
    log::info!(
        "loaded credentials for {} user(s) from {}",
        config.users.len(),
        cli.credentials.display()
    );

    let teachers = config::load_teacher_details(&cli.teachers);

    let urls = PortalUrls {
        login: config.login_url.clone(),
        dashboard: config.attendance_dashboard_url.clone(),
    };
    let collector = SessionCollector::new(!cli.headed, cli.browser_path.clone(), cli.tmp_dir.clone());
    let writer = DatasetWriter::new(cli.out_dir.clone(), cli.tmp_dir.clone());

    // One session at a time; a failed user contributes nothing and the run
    // moves on.
    let mut collected = Vec::new();
    for user in &config.users {
        match collector.fetch_dashboard(user, &urls).await {
            Ok(fragment) => {
                let records = parse_dashboard(&fragment, &user.section_label);
                writer.write_session(&records, &fragment, &user.section_label);
                collected.extend(records);
            }
            Err(e) => {
                log::warn!("skipping user {}: {e}", user.id);
            }
        }
    }

    if collected.is_empty() {
        log::error!("no dashboard data collected from any user; cannot generate final routine");
        process::exit(1);
    }

    let routine = combine_routine(
        &collected,
        &teachers,
        config.primary_tag(),
        config.secondary_tag(),
    );
    if routine.is_empty() {
        log::error!("no valid routine entries found after combining");
        process::exit(1);
    }

    log::info!("generated {} unique combined routine entries", routine.len());
    writer.write_final(&routine);
}
