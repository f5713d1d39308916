//! Command-line interface and REPL
//!
//! The editor blocks, so the REPL runs on a blocking thread and talks to the
//! session loop through `SessionRequest`s.

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::{mpsc, oneshot};

use crate::commands::{catalog, GlobalQuery, RoomCommand, TargetSelector, CATALOG};
use crate::osc::{InboundMessage, OscArg};
use crate::session::SessionRequest;
use crate::variables::variable_definitions;

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Send { path: String, args: Vec<OscArg> },
    Room(RoomCommand),
    Query(GlobalQuery),
    Inject(String, Vec<OscArg>),
    Commands(Option<String>),
    Rooms,
    Vars,
    Feedbacks,
    Help,
    Quit,
    Empty,
}

const HELP: &str = "\
Commands:
  send <path> [args..]                         raw OSC command
  room <roomID|roomName|roomIndex> <value> <command> [args..]
  room allRooms <command> [args..]             room-targeted command
  commands [filter]                            list room commands and arguments
  query <addedRoomList|pairedRoomList|addedRoomCount|pairedRoomCount>
  inject <address> [args..]                    apply telemetry locally
  rooms                                        registry as JSON
  vars                                         display variables
  feedbacks                                    feedback states
  help | quit
Arguments: true/false -> bool, integers -> int, anything else -> string";

/// Parse one console line
pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ReplCommand::Empty);
    };
    let rest: Vec<&str> = words.collect();
    let literals = |words: &[&str]| words.iter().map(|w| OscArg::parse_literal(w)).collect::<Vec<_>>();

    match verb {
        "send" | "inject" => {
            let (path, args) = rest
                .split_first()
                .ok_or_else(|| format!("Usage: {} <path> [args..]", verb))?;
            if verb == "send" {
                Ok(ReplCommand::Send {
                    path: path.to_string(),
                    args: literals(args),
                })
            } else {
                Ok(ReplCommand::Inject(path.to_string(), literals(args)))
            }
        }
        "room" => {
            let (segment, rest) = rest
                .split_first()
                .ok_or("Usage: room <target> [value] <command> [args..]")?;
            let (value, rest) = if TargetSelector::takes_value(segment) {
                let (value, rest) = rest.split_first().ok_or("Missing target value")?;
                (Some(*value), rest)
            } else {
                (None, rest)
            };
            let target = TargetSelector::parse(segment, value)?;
            let (command, args) = rest.split_first().ok_or("Missing command name")?;
            let spec = catalog::lookup(command).ok_or_else(|| {
                format!("Unknown room command '{}', try 'commands' or use 'send' for raw OSC", command)
            })?;
            Ok(ReplCommand::Room(spec.build(target, args)?))
        }
        "query" => {
            let name = rest.first().ok_or("Usage: query <name>")?;
            Ok(ReplCommand::Query(name.parse()?))
        }
        "commands" => Ok(ReplCommand::Commands(rest.first().map(|f| f.to_ascii_lowercase()))),
        "rooms" => Ok(ReplCommand::Rooms),
        "vars" => Ok(ReplCommand::Vars),
        "feedbacks" => Ok(ReplCommand::Feedbacks),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("Unknown command '{}', try 'help'", other)),
    }
}

/// Run the REPL until `quit` or EOF; dropping the sender ends the session loop
pub async fn run_repl(requests: mpsc::Sender<SessionRequest>) -> Result<()> {
    tokio::task::spawn_blocking(move || repl_loop(requests)).await??;
    Ok(())
}

fn repl_loop(requests: mpsc::Sender<SessionRequest>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "RoomOSC console, type 'help' for commands".bold().cyan());

    loop {
        let line = match rl.readline("roomosc> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = rl.add_history_entry(line.as_str());

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.red());
                continue;
            }
        };

        let request = match command {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{}", HELP);
                continue;
            }
            ReplCommand::Commands(filter) => {
                print_catalog(filter.as_deref());
                continue;
            }
            ReplCommand::Send { path, args } => SessionRequest::Send { path, args },
            ReplCommand::Room(command) => SessionRequest::Room(command),
            ReplCommand::Query(query) => SessionRequest::Query(query),
            ReplCommand::Inject(address, args) => {
                SessionRequest::Inject(InboundMessage::new(address, args.iter().map(OscArg::to_osc).collect()))
            }
            ReplCommand::Rooms => {
                let (tx, rx) = oneshot::channel();
                if requests.blocking_send(SessionRequest::Registry(tx)).is_err() {
                    break;
                }
                if let Ok(snapshot) = rx.blocking_recv() {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                continue;
            }
            ReplCommand::Vars => {
                let (tx, rx) = oneshot::channel();
                if requests.blocking_send(SessionRequest::Variables(tx)).is_err() {
                    break;
                }
                if let Ok(values) = rx.blocking_recv() {
                    for def in variable_definitions() {
                        if let Some(value) = values.get(&def.id) {
                            println!("  {:32} {:32} {}", def.id.yellow(), def.name.dimmed(), value);
                        }
                    }
                }
                continue;
            }
            ReplCommand::Feedbacks => {
                let (tx, rx) = oneshot::channel();
                if requests.blocking_send(SessionRequest::Feedbacks(tx)).is_err() {
                    break;
                }
                if let Ok(states) = rx.blocking_recv() {
                    if states.is_empty() {
                        println!("  {}", "No feedbacks configured".dimmed());
                    }
                    for (id, state) in states {
                        let state = if state { "ON".bright_green() } else { "off".bright_black() };
                        println!("  {:32} {}", id.yellow(), state);
                    }
                }
                continue;
            }
        };

        if requests.blocking_send(request).is_err() {
            break;
        }
    }

    Ok(())
}

/// Catalog entries whose name or group contains `filter`
fn print_catalog(filter: Option<&str>) {
    let wanted = |name: &str, group: &str| match filter {
        Some(f) => name.to_ascii_lowercase().contains(f) || group == f,
        None => true,
    };

    for spec in CATALOG.iter().filter(|s| wanted(s.name, s.group.as_str())) {
        println!(
            "  {:8} {:36} {:40} {}",
            spec.group.as_str().dimmed(),
            spec.name.yellow(),
            spec.usage(),
            spec.label.bright_black()
        );
    }
}
