use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pgaudit_config::{AuditConfig, parse_config_file};
use pgaudit_eval::{Auditor, EventDescriptor, SessionContext, classify};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "pgaudit-rules")]
#[command(about = "Validate audit rule configurations, classify and evaluate audit events")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a configuration file, print the snapshot as JSON
    Check {
        /// Path to an audit configuration file
        path: PathBuf,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Classify events and print the class of each
    ///
    /// Events are JSON objects tagged with `"kind": "statement"` or
    /// `"kind": "message"`, given with --event or as NDJSON on stdin.
    Classify {
        /// A single event as a JSON string (if omitted, reads NDJSON from stdin)
        #[arg(short, long)]
        event: Option<String>,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Classify, evaluate and render events against a configuration
    ///
    /// Each event may carry its own `"session"` object; otherwise the
    /// --session default applies.
    Eval {
        /// Path to an audit configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// A single event as a JSON string (if omitted, reads NDJSON from stdin)
        #[arg(short, long)]
        event: Option<String>,

        /// Default session context as a JSON string
        #[arg(short, long)]
        session: Option<String>,

        /// Print rendered audit lines instead of JSON records
        #[arg(short, long)]
        lines: bool,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

/// One input record for `eval`.
#[derive(Deserialize)]
struct EvalInput {
    #[serde(flatten)]
    event: EventDescriptor,
    #[serde(default)]
    session: Option<SessionContext>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { path, pretty } => cmd_check(path, pretty),
        Commands::Classify { event, pretty } => cmd_classify(event, pretty),
        Commands::Eval {
            config,
            event,
            session,
            lines,
            pretty,
        } => cmd_eval(config, event, session, lines, pretty),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_check(path: PathBuf, pretty: bool) {
    let config = load_config(&path);
    eprintln!(
        "{}: OK ({} rule section(s), logger {:?}, level {:?})",
        path.display(),
        config.rule_count(),
        config.output.logger,
        config.options.log_level,
    );
    print_json(&config, pretty);
}

fn cmd_classify(event_json: Option<String>, pretty: bool) {
    if let Some(json_str) = event_json {
        let event: EventDescriptor = match serde_json::from_str(&json_str) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("Invalid JSON event: {e}");
                process::exit(1);
            }
        };
        match classify(&event) {
            Some(c) => print_json(&c, pretty),
            None => eprintln!("Not classifiable."),
        }
        return;
    }

    let mut total = 0u64;
    let mut classified = 0u64;
    for_each_stdin_json(|line_num, event: EventDescriptor| {
        total += 1;
        match classify(&event) {
            Some(c) => {
                classified += 1;
                print_json(&c, pretty);
            }
            None => log::debug!("line {line_num}: not classifiable"),
        }
    });
    eprintln!("Processed {total} events, {classified} classified.");
}

fn cmd_eval(
    config_path: PathBuf,
    event_json: Option<String>,
    session_json: Option<String>,
    lines: bool,
    pretty: bool,
) {
    let config = load_config(&config_path);
    eprintln!(
        "Loaded {} rule section(s) from {}",
        config.rule_count(),
        config_path.display()
    );
    let auditor = Auditor::new(Arc::new(config));

    let default_session = match session_json {
        Some(s) => match serde_json::from_str::<SessionContext>(&s) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Invalid JSON session: {e}");
                process::exit(1);
            }
        },
        None => SessionContext::default(),
    };

    let emit = |input: EvalInput| -> usize {
        let session = input.session.as_ref().unwrap_or(&default_session);
        match auditor.audit(&input.event, session) {
            Ok(Some(record)) => {
                if lines {
                    for line in &record.lines {
                        println!("{line}");
                    }
                } else {
                    print_json(&record, pretty);
                }
                record.lines.len()
            }
            Ok(None) => 0,
            Err(e) => {
                eprintln!("Evaluation error: {e}");
                0
            }
        }
    };

    if let Some(json_str) = event_json {
        let input: EvalInput = match serde_json::from_str(&json_str) {
            Ok(i) => i,
            Err(e) => {
                eprintln!("Invalid JSON event: {e}");
                process::exit(1);
            }
        };
        if emit(input) == 0 {
            eprintln!("No matches.");
        }
        return;
    }

    let mut total = 0u64;
    let mut line_count = 0usize;
    for_each_stdin_json(|_, input: EvalInput| {
        total += 1;
        line_count += emit(input);
    });
    eprintln!("Processed {total} events, {line_count} audit lines.");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> AuditConfig {
    match parse_config_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading {}: {e}", path.display());
            process::exit(1);
        }
    }
}

/// Read NDJSON from stdin, skipping blank and malformed lines.
fn for_each_stdin_json<T, F>(mut f: F)
where
    T: for<'de> Deserialize<'de>,
    F: FnMut(u64, T),
{
    let stdin = io::stdin();
    let mut line_num = 0u64;

    for line in stdin.lock().lines() {
        line_num += 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading line {line_num}: {e}");
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(v) => f(line_num, v),
            Err(e) => eprintln!("Invalid JSON on line {line_num}: {e}"),
        }
    }
}

fn print_json(value: &impl serde::Serialize, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(j) => println!("{j}"),
        Err(e) => {
            eprintln!("JSON serialization error: {e}");
            process::exit(1);
        }
    }
}
