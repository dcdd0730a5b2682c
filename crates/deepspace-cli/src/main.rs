//! `deepspace-cli` – DeepSpace Command Line Interface
//!
//! This binary runs a robot session on the simulated rig.  It:
//!
//! 1. Initialises structured logging (and OTLP span export when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set).
//! 2. Loads `~/.deepspace/config.toml`, writing the defaults on first run.
//! 3. Assembles the robot from the simulated hardware and the enabled
//!    features, then homes the leadscrew.
//! 4. Runs the fixed-period control loop with an **operator shell** beside
//!    it (`/status`, `/request`, `/stop`, `/help`).  Pass `--headless` to run
//!    without the shell.
//! 5. Intercepts **Ctrl-C** to drive every mechanism to neutral before
//!    exiting.

mod config;
mod repl;
mod session;

use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use deepspace_hal::SimRig;
use deepspace_runtime::{ControlLoop, Robot, init_tracing};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG (default "info"); DEEPSPACE_LOG_FORMAT=json for JSON lines.
    // User-facing output still uses println!.
    let _tracing = init_tracing("deepspace");

    print_banner();
    let headless = std::env::args().skip(1).any(|a| a == "--headless");

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => first_run(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Robot assembly ────────────────────────────────────────────────────
    let (hardware, _sim) = SimRig::full(
        cfg.robot.leadscrew.travel_ticks(),
        cfg.sim.leadscrew_speed_ticks,
    )
    .build();
    let robot = match Robot::assemble(hardware, &cfg.robot) {
        Ok(robot) => robot,
        Err(e) => {
            error!(error = %e, "robot assembly failed");
            println!("{}: {}", "Robot assembly failed".red().bold(), e);
            std::process::exit(1);
        }
    };
    let mut ctl = ControlLoop::new(robot, &cfg.robot);

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let stop = ctl.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – stopping every mechanism …".yellow().bold()
        );
        stop.store(true, Ordering::SeqCst);
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will not stop the mechanisms");
    }

    // ── Homing ────────────────────────────────────────────────────────────
    if cfg.sim.blocking_homing {
        print!("  Homing leadscrew … ");
        std::io::stdout().flush().ok();
        match ctl.home_blocking(&shutdown) {
            Ok(steps) => println!("{} ({} steps)", "OK".green(), steps),
            Err(e) => println!("{}: {}", "FAILED".red(), e),
        }
    } else {
        println!("  Leadscrew homes in the loop's first cycles.");
    }

    // ── Control loop ──────────────────────────────────────────────────────
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start the runtime".red(), e);
            std::process::exit(1);
        }
    };

    let (handle, commands, status) = session::channels(&ctl);
    if !headless {
        println!();
        println!(
            "  Type {} for a list of commands.\n",
            "/help".bold().cyan()
        );
        let shell_shutdown = shutdown.clone();
        std::thread::spawn(move || repl::run(handle, shell_shutdown));
    }

    let last = runtime.block_on(session::run(ctl, commands, status));

    println!();
    println!("{}", "═══════════════════════════════════════".bold());
    repl::print_status(&last);
    println!("{}", "═══════════════════════════════════════".bold());
    if last.fault.is_some() {
        std::process::exit(2);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First run
// ─────────────────────────────────────────────────────────────────────────────

fn first_run() -> config::Config {
    println!();
    println!("  No configuration found.  Writing defaults.");
    let cfg = config::Config::default();
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    ___                 ____                     "#.bold().cyan());
    println!("{}", r#"   / _ \ ___  ___  ___ / __/___  ___ _ ____ ___ "#.bold().cyan());
    println!("{}", r#"  / // // -_)/ -_)/ _ \\ \ / _ \/ _ `// __// -_)"#.bold().cyan());
    println!("{}", r#" /____/ \__/ \__// .__/___// .__/\_,_/ \__/ \__/ "#.bold().cyan());
    println!("{}", r#"                /_/       /_/                    "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "DeepSpace".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot mechanism coordination");
    println!();
}
