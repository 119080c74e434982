//! CLI entry point for hotkey-binder
//!
//! Runs a bindings file as live global hotkeys, checks and lists
//! bindings files, resolves accelerators against the keyboard and
//! reports idle time.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use hotkey_binder::backend::{simulated::SimulatedDisplay, x11};
use hotkey_binder::config::{self, ActiveConfig, ApplyOutcome, FileWatcher, ValidationReport};
use hotkey_binder::idle::{IdleProbe, IdleSource, ManualIdleClock};
use hotkey_binder::{Handler, HotkeyService, LoopState};
use parking_lot::Mutex;
use std::io::BufRead;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often the run loop looks up from the file watcher
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "hotkey-binder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind every hotkey in a bindings file and reload it on change
    Run {
        /// Path to bindings file
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
        config: String,

        /// X display to connect to (defaults to $DISPLAY)
        #[arg(short, long)]
        display: Option<String>,

        /// Use the in-memory display; accelerators typed on stdin are pressed
        #[arg(long)]
        simulate: bool,
    },

    /// Check a bindings file for errors and conflicts
    Check {
        /// Path to bindings file
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
        config: String,
    },

    /// List the bindings in a bindings file
    List {
        /// Path to bindings file
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
        config: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print seconds since last user input
    Idle {
        /// X display to connect to (defaults to $DISPLAY)
        #[arg(short, long)]
        display: Option<String>,

        /// Keep printing once a second
        #[arg(short, long)]
        watch: bool,
    },

    /// Show the canonical form of accelerators on this keyboard
    Keys {
        /// Accelerators such as "<Ctrl><Alt>T"
        #[arg(required = true)]
        accelerators: Vec<String>,

        /// X display to connect to (defaults to $DISPLAY)
        #[arg(short, long)]
        display: Option<String>,

        /// Resolve against the built-in US keymap instead of a display
        #[arg(long)]
        simulate: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            display,
            simulate,
        } => run(&config::expand_path(&config), display.as_deref(), simulate)?,
        Commands::Check { config } => check(&config::expand_path(&config))?,
        Commands::List { config, json } => list(&config::expand_path(&config), json)?,
        Commands::Idle { display, watch } => idle(display.as_deref(), watch),
        Commands::Keys {
            accelerators,
            display,
            simulate,
        } => keys(&accelerators, display.as_deref(), simulate)?,
    }

    Ok(())
}

/// Bind the file, start dispatch and follow edits until the display goes away
fn run(config_path: &Path, display: Option<&str>, simulate: bool) -> anyhow::Result<()> {
    let report = config::load_config(config_path)?;
    println!("{} Loaded bindings: {}", "→".cyan(), config_path.display());
    print_issues(&report);

    if simulate {
        let (simulated, events) = SimulatedDisplay::new();
        let service = Arc::new(HotkeyService::new(simulated.clone(), events)?);
        let clock = ManualIdleClock::new();
        spawn_simulated_input(simulated, clock.clone())?;
        serve(service, IdleProbe::with_source(clock), config_path, &report)
    } else {
        let (backend, events) = x11::connect(display).context("Failed to open X display")?;
        let service = Arc::new(HotkeyService::new(backend, events)?);
        serve(service, IdleProbe::init(display), config_path, &report)
    }
}

fn serve<S>(
    service: Arc<HotkeyService>,
    probe: IdleProbe<S>,
    config_path: &Path,
    report: &ValidationReport,
) -> anyhow::Result<()>
where
    S: IdleSource + 'static,
{
    let status = status_handler(Arc::downgrade(&service), probe);
    let mut active = ActiveConfig::new(Arc::clone(&service), Some(status));

    print_outcome(&active.apply(report));
    service.start()?;
    info!(
        backend = service.backend_name(),
        bindings = service.bindings().len(),
        "Hotkeys active"
    );

    let watcher = FileWatcher::new(config_path)?;
    while service.state() != LoopState::Stopped {
        if !watcher.wait_for_change(POLL_INTERVAL) {
            continue;
        }

        match config::load_config(config_path) {
            Ok(report) => {
                println!("{} Reloading {}", "↻".cyan(), config_path.display());
                print_issues(&report);
                print_outcome(&active.apply(&report));
            }
            Err(err) => warn!(error = %err, "Reload failed, keeping current bindings"),
        }
    }

    warn!("Display connection closed");
    Ok(())
}

/// Handler for the `keybinding = ...` hotkey: a one-line status report.
///
/// Holds the service weakly; the service owns this handler.
fn status_handler<S>(service: Weak<HotkeyService>, probe: IdleProbe<S>) -> Handler
where
    S: IdleSource + 'static,
{
    let probe = Mutex::new(probe);
    Handler::new(move |_| {
        let bound = service
            .upgrade()
            .map(|service| service.bindings().len())
            .unwrap_or(0);
        println!(
            "{} {} hotkeys bound, idle for {}s",
            "●".green(),
            bound,
            probe.lock().idle_seconds()
        );
        Ok(())
    })
}

/// Presses accelerators read from stdin and ticks the idle clock.
fn spawn_simulated_input(display: SimulatedDisplay, clock: ManualIdleClock) -> std::io::Result<()> {
    let ticker = clock.clone();
    thread::Builder::new()
        .name("simulated-clock".to_string())
        .spawn(move || loop {
            thread::sleep(POLL_INTERVAL);
            ticker.advance(POLL_INTERVAL);
        })?;

    thread::Builder::new()
        .name("simulated-input".to_string())
        .spawn(move || {
            println!(
                "{}",
                "Simulated display: type an accelerator and press Enter".dimmed()
            );
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let accelerator = line.trim();
                if accelerator.is_empty() {
                    continue;
                }

                clock.input();
                if !display.press(accelerator) {
                    println!("{} {} is not bound", "✗".red(), accelerator);
                }
            }
            display.disconnect();
        })?;

    Ok(())
}

/// Check a bindings file for errors and conflicts
fn check(config_path: &Path) -> anyhow::Result<()> {
    let report = config::load_config(config_path)?;

    println!("{} Checking bindings: {}", "→".cyan(), config_path.display());
    println!(
        "{} Found {} bindings\n",
        "✓".green(),
        report.config.bindings.len()
    );

    print_issues(&report);

    for (i, conflict) in report.conflicts.iter().enumerate() {
        println!(
            "{} {}",
            format!("Conflict {}", i + 1).yellow().bold(),
            conflict.combination.to_string().cyan()
        );
        for line in &conflict.lines {
            println!("  {} line {}", "•".dimmed(), line);
        }
        println!();
    }

    if report.is_clean() {
        println!("{} {}", "✓".green().bold(), "No problems detected!".bold());
        return Ok(());
    }

    println!(
        "{} {} error{}, {} conflict{}",
        "✗".red().bold(),
        report.issues.len(),
        plural(report.issues.len()),
        report.conflicts.len(),
        plural(report.conflicts.len())
    );
    std::process::exit(1);
}

/// List all bindings in a bindings file
fn list(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let report = config::load_config(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Bindings from: {}\n", config_path.display()).bold()
    );

    if let Some((line, accelerator)) = &report.config.keybinding {
        println!(
            "{} {} → {}",
            format!("{:>4}", line).dimmed(),
            accelerator.cyan().bold(),
            "status".magenta()
        );
    }

    for spec in &report.config.bindings {
        let invalid = report.issues.iter().any(|issue| issue.line == spec.line);
        let marker = if invalid { " ✗".red() } else { "".normal() };
        println!(
            "{} {} → {} {}{}",
            format!("{:>4}", spec.line).dimmed(),
            spec.accelerator.cyan().bold(),
            spec.action.green(),
            spec.args.as_deref().unwrap_or_default(),
            marker
        );
    }

    println!(
        "\n{} Total: {} bindings",
        "✓".green(),
        report.config.bindings.len()
    );

    Ok(())
}

fn idle(display: Option<&str>, watch: bool) {
    let mut probe = IdleProbe::init(display);
    if !probe.is_available() {
        eprintln!("{}", "⚠ Idle time unavailable, reporting 0".yellow());
    }

    loop {
        println!("{}", probe.idle_seconds());
        if !watch {
            break;
        }
        thread::sleep(Duration::from_secs(1));
    }

    probe.close();
}

/// Resolve accelerators against a live (or simulated) keyboard
fn keys(accelerators: &[String], display: Option<&str>, simulate: bool) -> anyhow::Result<()> {
    let service = if simulate {
        let (simulated, events) = SimulatedDisplay::new();
        HotkeyService::new(simulated, events)?
    } else {
        let (backend, events) = x11::connect(display).context("Failed to open X display")?;
        HotkeyService::new(backend, events)?
    };

    let mut failed = 0;
    for accelerator in accelerators {
        match service.canonical_form(accelerator) {
            Ok(combination) => println!(
                "{} → {}",
                accelerator,
                combination.to_string().cyan().bold()
            ),
            Err(err) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), accelerator, err);
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_issues(report: &ValidationReport) {
    for issue in &report.issues {
        println!(
            "{} line {}: {}",
            "✗".red().bold(),
            issue.line,
            issue.message
        );
    }
}

fn print_outcome(outcome: &ApplyOutcome) {
    for accelerator in &outcome.unbound {
        println!("  {} {}", "-".red(), accelerator);
    }
    for accelerator in &outcome.bound {
        println!("  {} {}", "+".green(), accelerator.cyan());
    }
    for (line, accelerator, reason) in &outcome.failures {
        // Validation issues were already printed
        if accelerator.is_empty() {
            continue;
        }
        println!(
            "  {} line {} {}: {}",
            "✗".red(),
            line,
            accelerator,
            reason
        );
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
