// src/main.rs
mod config;
mod drivers;
mod engine;
mod export;
mod operator;
mod session;
mod types;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::config::CollectorConfig;
use crate::drivers::{DeviceLink, SerialLink, SimulatedLink};
use crate::operator::Console;
use crate::session::RecordingSession;

#[derive(Parser, Debug)]
#[command(version, about = "Grove GSR collector with Ledalab-compatible export")]
struct Cli {
    /// Serial port of the Arduino; prompted for when several are present
    #[arg(short, long)]
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// JSON file with collector settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base name for the exported files (".mat" is added when missing)
    #[arg(short, long)]
    output: Option<String>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Use a synthetic device instead of a serial port
    #[arg(long)]
    simulate: bool,

    /// Also write a PNG plot of the recording
    #[arg(long)]
    preview: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn load_config(cli: &Cli) -> Result<CollectorConfig> {
    let mut config = match &cli.config {
        Some(path) => CollectorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CollectorConfig::default(),
    };
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    config.preview_plot |= cli.preview;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.list_ports {
        operator::print_ports(&SerialLink::available_ports());
        return Ok(());
    }

    println!("{}", "=".repeat(70));
    println!("Grove GSR collector - Ledalab compatible export");
    println!("{}", "=".repeat(70));

    let console = Console::new();
    if cli.simulate {
        let mut session = RecordingSession::new(&config);
        session.attach(SimulatedLink::new(config.simulated_rate_hz), "simulator", &config)?;
        run(session, console, &cli, &config)
    } else {
        let port = match &cli.port {
            Some(port) => port.clone(),
            None => operator::choose_port(&SerialLink::available_ports(), &console)?,
        };
        let mut session = RecordingSession::new(&config);
        session
            .connect(&port, &config)
            .with_context(|| format!("could not connect to {port}"))?;
        run(session, console, &cli, &config)
    }
}

fn run<L: DeviceLink>(
    mut session: RecordingSession<L>,
    mut console: Console,
    cli: &Cli,
    config: &CollectorConfig,
) -> Result<()> {
    if !console.wait_for_enter("\nPress Enter to start recording...") {
        warn!("cancelled before recording started");
        return Ok(());
    }
    println!("Recording... press Enter (or Ctrl-C) to stop");
    let count = engine::record_until_stopped(&mut session, &mut console, config)
        .context("acquisition failed")?;
    if console.interrupted() {
        warn!("interrupted by user");
    }
    info!("{count} samples recorded");

    let base = match &cli.output {
        Some(base) => Some(base.clone()),
        // skip the prompt on Ctrl-C; the timestamped default is used
        None if console.interrupted() => None,
        None => {
            println!("\n{}", "=".repeat(70));
            console
                .ask("Output file name (leave empty for automatic): ")
                .filter(|name| !name.is_empty())
        }
    };

    let samples = session.buffer().map(|b| b.snapshot()).unwrap_or_default();
    let report =
        export::export_recording(samples, base.as_deref(), config).context("nothing was saved")?;
    if let Some(verification) = &report.verification {
        if !verification.is_complete() {
            warn!(
                "MAT file is missing fields {:?}; try the text backup",
                verification.missing_fields()
            );
        }
    }
    let port = session.port_name().to_string();
    session.close();

    println!("\n{}", "=".repeat(70));
    println!("Recording from {port}:");
    for line in report.closing_lines() {
        println!("{line}");
    }
    operator::print_import_hints(report.structured.is_written(), report.tab.is_written());
    println!("{}", "=".repeat(70));
    if !report.any_written() {
        return Err(anyhow!("every export artifact failed"));
    }
    Ok(())
}
