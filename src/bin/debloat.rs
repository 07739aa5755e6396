use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::Receiver;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use app_debloater_lib::app::adb::client::{probe_adb, AdbClient};
use app_debloater_lib::app::adb::locator::normalize_command_path;
use app_debloater_lib::app::catalog::{known_packages, Category, KnownPackage, SafetyLevel};
use app_debloater_lib::app::config::{load_config, AppConfig};
use app_debloater_lib::app::error::AppError;
use app_debloater_lib::app::inventory::check_connectivity;
use app_debloater_lib::app::logging::{init_logging_with_level, resolve_trace_id};
use app_debloater_lib::app::models::{BatchSummary, DeviceSummary, ScanReport};
use app_debloater_lib::app::selection::{Filters, ReviewWarning, SelectionState};
use app_debloater_lib::app::session::{Session, SessionEvent};

#[derive(Parser, Debug)]
#[command(
    name = "debloat",
    version,
    about = "Uninstall or disable known bloatware on an Android device over adb"
)]
struct Cli {
    #[arg(long, global = true, help = "adb executable (overrides config)")]
    adb: Option<String>,
    #[arg(long, global = true, help = "Device serial to target (overrides config)")]
    serial: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that adb can be found and run.
    Check,
    /// Verify a device is connected and authorized.
    Devices,
    /// List the known bloatware table.
    Catalog {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List known bloatware installed on the device.
    Scan {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, help = "Output machine-readable JSON")]
        json: bool,
    },
    /// Uninstall (or disable) the selected packages.
    Remove {
        /// Packages to process, in this order.
        packages: Vec<String>,
        #[arg(long, value_name = "LEVEL", conflicts_with = "packages")]
        select_safety: Option<SafetyLevel>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long, help = "SAFE, CAUTION or RISKY")]
    safety: Option<SafetyLevel>,
    #[arg(long, help = "e.g. Xiaomi, Google, Other_ThirdParty")]
    category: Option<Category>,
}

impl FilterArgs {
    fn filters(&self) -> Filters {
        Filters {
            safety: self.safety,
            category: self.category,
        }
    }
}

#[derive(Serialize)]
struct ScanOut<'a> {
    trace_id: &'a str,
    devices: &'a [DeviceSummary],
    installed_count: usize,
    packages: Vec<&'static KnownPackage>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let trace_id = resolve_trace_id(None);
    let mut config = load_config(&trace_id).context("loading config")?;
    if let Some(adb) = cli.adb.as_deref().map(normalize_command_path) {
        config.adb.command_path = adb;
    }
    if cli.serial.is_some() {
        config.adb.serial = cli.serial.clone();
    }
    init_logging_with_level(&config.logging.log_level);

    let client = AdbClient::from_config(&config);
    match cli.command {
        Commands::Check => Ok(check(&client, &trace_id)),
        Commands::Devices => Ok(devices(&client, &trace_id)),
        Commands::Catalog { filters } => Ok(catalog(filters.filters())),
        Commands::Scan { filters, json } => scan(client, filters.filters(), json, &trace_id),
        Commands::Remove {
            packages,
            select_safety,
            filters,
            yes,
        } => remove(
            client,
            &config,
            RemoveRequest {
                packages,
                select_safety,
                filters: filters.filters(),
                yes,
            },
            &trace_id,
        ),
    }
}

fn check(client: &AdbClient, trace_id: &str) -> ExitCode {
    let info = probe_adb(client, trace_id);
    if info.available {
        println!("{}", info.version_output);
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "adb unavailable ({}): {}",
            info.command_path,
            info.error.unwrap_or_default()
        );
        ExitCode::FAILURE
    }
}

fn devices(client: &AdbClient, trace_id: &str) -> ExitCode {
    match check_connectivity(client, trace_id) {
        Ok(devices) => {
            for device in devices {
                println!(
                    "{}\t{}\t{}",
                    device.serial,
                    device.state,
                    device.model.unwrap_or_default()
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn catalog(filters: Filters) -> ExitCode {
    for entry in known_packages().iter().filter(|entry| filters.matches(entry)) {
        print_entry(entry);
    }
    ExitCode::SUCCESS
}

fn scan(client: AdbClient, filters: Filters, json: bool, trace_id: &str) -> anyhow::Result<ExitCode> {
    let (session, events) = Session::new(client);
    let Some((report, selection)) = run_scan(&session, &events, filters, trace_id)? else {
        return Ok(ExitCode::FAILURE);
    };

    let visible = selection.visible();
    if json {
        let out = ScanOut {
            trace_id: &report.trace_id,
            devices: &report.devices,
            installed_count: report.installed_count,
            packages: visible,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for entry in &visible {
            print_entry(entry);
        }
        eprintln!(
            "{} of {} installed packages are known bloatware ({} shown).",
            report.bloatware.len(),
            report.installed_count,
            visible.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}

struct RemoveRequest {
    packages: Vec<String>,
    select_safety: Option<SafetyLevel>,
    filters: Filters,
    yes: bool,
}

fn remove(
    client: AdbClient,
    config: &AppConfig,
    request: RemoveRequest,
    trace_id: &str,
) -> anyhow::Result<ExitCode> {
    let (session, events) = Session::new(client);
    let Some((_, mut selection)) = run_scan(&session, &events, request.filters, trace_id)? else {
        return Ok(ExitCode::FAILURE);
    };

    if let Some(level) = request.select_safety {
        selection.select_by_safety(level);
    } else if request.packages.is_empty() {
        bail!("name the packages to remove or pass --select-safety");
    } else {
        for package in &request.packages {
            if !selection.select(package) {
                bail!("{package} is not installed known bloatware matching the filters");
            }
        }
    }

    let Some(review) = selection.review() else {
        eprintln!("No apps selected for processing.");
        return Ok(ExitCode::SUCCESS);
    };
    println!("{}\n", review.message);
    for entry in &review.packages {
        println!("  - {} ({})", entry.package_name, entry.safety);
    }

    let must_confirm = review.warning != ReviewWarning::None || config.ui.confirm_safe_batches;
    if !request.yes && must_confirm && !confirm(review.packages.len())? {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let worker = session.start_batch(review.package_names(), trace_id)?;
    let summary = drain_batch(&events)?;
    worker
        .join()
        .map_err(|_| anyhow!("batch worker panicked"))?;
    Ok(if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one scan to completion, printing status lines as they arrive. `None` when
/// the scan failed; the failure has already been reported.
fn run_scan(
    session: &Session,
    events: &Receiver<SessionEvent>,
    filters: Filters,
    trace_id: &str,
) -> anyhow::Result<Option<(ScanReport, SelectionState)>> {
    let worker = session.start_scan(trace_id)?;
    let result = loop {
        match events.recv().context("scan worker stopped")? {
            SessionEvent::Status(line) => eprintln!("{}", line.message),
            SessionEvent::ScanFinished(result) => break result,
            _ => {}
        }
    };
    worker.join().map_err(|_| anyhow!("scan worker panicked"))?;

    let report = match result {
        Ok(report) => report,
        Err(_) => return Ok(None),
    };
    let mut selection = SelectionState::new();
    selection.replace_inventory(report.bloatware.clone());
    selection.set_filters(filters);
    Ok(Some((report, selection)))
}

fn drain_batch(events: &Receiver<SessionEvent>) -> anyhow::Result<BatchSummary> {
    loop {
        match events.recv().context("batch worker stopped")? {
            SessionEvent::Status(line) => println!("{}", line.message),
            SessionEvent::BatchFinished(summary) => return Ok(summary),
            _ => {}
        }
    }
}

fn confirm(count: usize) -> anyhow::Result<bool> {
    print!("Proceed with processing {count} app(s)? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_entry(entry: &KnownPackage) {
    println!(
        "{:<8}{:<18}{:<48}{}",
        entry.safety.as_str(),
        entry.category.as_str(),
        entry.package_name,
        entry.description
    );
}

fn report_error(err: &AppError) {
    eprintln!("Error: {err}");
    if let Some(output) = &err.partial_output {
        eprintln!("ADB Output:\n{}", output.trim());
    }
}
