//! REPL – the operator shell beside a running control loop.
//!
//! Supported slash-commands:
//!   /help            – show this list
//!   /status          – phase, robot state and cycle health
//!   /states          – list every robot state name
//!   /request <STATE> – queue a robot state (e.g. `BALL_FRONT_SCORE`)
//!   /stop            – stop every mechanism; the shell stays open
//!   /quit | /exit    – stop every mechanism and leave

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use deepspace_runtime::Phase;
use deepspace_types::{MechError, RobotState};

use crate::session::{Command, LoopStatus, SessionHandle};

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Status,
    States,
    Request(RobotState),
    Stop,
    Quit,
}

/// Why a line was not a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    MissingState,
    /// The name is outside [`RobotState`]; nothing is sent to the loop.
    UnknownState(MechError),
}

pub fn parse(line: &str) -> Result<ShellCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Err(ParseError::Empty);
    };
    match cmd {
        "/help" => Ok(ShellCommand::Help),
        "/status" => Ok(ShellCommand::Status),
        "/states" => Ok(ShellCommand::States),
        "/request" => {
            let name = words.next().ok_or(ParseError::MissingState)?;
            name.to_ascii_uppercase()
                .parse::<RobotState>()
                .map(ShellCommand::Request)
                .map_err(ParseError::UnknownState)
        }
        "/stop" => Ok(ShellCommand::Stop),
        "/quit" | "/exit" => Ok(ShellCommand::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Entry point for the interactive shell.
///
/// `shutdown` is polled each iteration; when set the shell exits cleanly.
pub fn run(session: SessionHandle, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "deepspace>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        match parse(&line) {
            Ok(ShellCommand::Help) => cmd_help(),
            Ok(ShellCommand::Status) => print_status(&session.status.borrow()),
            Ok(ShellCommand::States) => cmd_states(),
            Ok(ShellCommand::Request(state)) => send(&session, Command::Request(state)),
            Ok(ShellCommand::Stop) => send(&session, Command::Stop),
            Ok(ShellCommand::Quit) => {
                send(&session, Command::Stop);
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Err(ParseError::Empty) => {}
            Err(ParseError::UnknownCommand(other)) => println!(
                "{} '{}'. Type {} for available commands.",
                "Unknown command:".red(),
                other.yellow(),
                "/help".bold()
            ),
            Err(ParseError::MissingState) => {
                println!("{} /request <STATE>", "Usage:".yellow())
            }
            Err(ParseError::UnknownState(e)) => println!("{}: {}", "Rejected".red(), e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "DeepSpace Commands".bold().underline());
    println!("  {}           – phase, robot state and cycle health", "/status".bold().cyan());
    println!("  {}           – list robot state names", "/states".bold().cyan());
    println!("  {} – queue a robot state", "/request <STATE>".bold().cyan());
    println!("  {}             – stop every mechanism", "/stop".bold().cyan());
    println!("  {}     – stop and exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_states() {
    for state in RobotState::ALL {
        println!("  {:>2}  {}", state.code(), state.name().bold());
    }
}

fn send(session: &SessionHandle, command: Command) {
    match session.commands.send(command) {
        Ok(()) => println!("  {} {:?}", "✓".green(), command),
        Err(_) => println!("{}", "Control loop is no longer running.".yellow()),
    }
}

pub fn print_status(status: &LoopStatus) {
    let phase = match status.phase {
        Phase::Running => status.phase.name().green(),
        Phase::Homing => status.phase.name().yellow(),
        Phase::Stopped => status.phase.name().red(),
    };
    println!("  Phase    : {}", phase.bold());
    println!("  State    : {}", status.state.name().bold());
    if let Some(pending) = status.pending {
        println!("  Pending  : {}", pending.name().yellow());
    }
    println!(
        "  Cycles   : {} ({} overrun(s), worst {:?})",
        status.cycles, status.overruns, status.worst
    );
    if let Some(fault) = &status.fault {
        println!("  Fault    : {}", fault.red());
    }
}
