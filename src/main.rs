//! Purpose: `popcol` CLI entry point.
//! Role: Binary crate root; parses args, runs one command, emits JSON on stdout.
//! Invariants: Message-log lines go to stderr as notices, never to stdout.
//! Invariants: Errors are emitted as JSON on stderr unless stderr is a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod shell;

use popcol::api::{DEFAULT_BASE_URL, Error, ErrorKind, MessageLog, Pop, PopService, to_exit_code};
use popcol::notice::{Notice, notice_json, notice_text};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
    /// Message-log lines already written to stderr by the command itself.
    messages_emitted: usize,
}

impl RunOutcome {
    fn ok() -> Self {
        Self::with_code(0)
    }

    fn with_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            messages_emitted: 0,
        }
    }

    fn emitted(mut self, messages_emitted: usize) -> Self {
        self.messages_emitted = messages_emitted;
        self
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `popcol --help` for usage."));
            }
        },
    };

    let messages = MessageLog::new();
    let service = PopService::new(&cli.url, messages.clone())?;
    let cmd = cli.command.name();
    let outcome = command_dispatch::dispatch_command(cli.command, &service, cli.quiet);
    let emitted = outcome
        .as_ref()
        .map(|outcome| outcome.messages_emitted)
        .unwrap_or(0);
    if !cli.quiet {
        emit_messages(cmd, &messages, emitted);
    }
    outcome
}

#[derive(Parser)]
#[command(
    name = "popcol",
    version,
    about = "List, search, add, and delete Pop collectibles on a remote REST store",
    long_about = None,
    after_help = r#"EXAMPLES
  $ popcol list
  $ popcol search "Vader"
  $ popcol add --name "Grogu" --price 14.99 --store 2
  $ popcol get 12 --strict
  $ popcol delete 12
  $ popcol shell

Diagnostics for every operation are written to stderr; pass --quiet to hide them.
Set RUST_LOG=debug for tracing output."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        env = "POPCOL_URL",
        default_value = DEFAULT_BASE_URL,
        help = "Base URL of the Pop collection endpoint"
    )]
    url: String,
    #[arg(long, global = true, help = "Do not print message-log notices to stderr")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Print every record in the collection")]
    List,
    #[command(about = "Fetch one record by id")]
    Get {
        id: u64,
        #[arg(long, help = "Fetch by path and fail with not-found on a miss")]
        strict: bool,
    },
    #[command(about = "Find records whose name contains TERM")]
    Search { term: String },
    #[command(about = "Create a record; the server assigns its id")]
    Add(PopFields),
    #[command(about = "Replace the record with ID")]
    Update {
        id: u64,
        #[command(flatten)]
        fields: PopFields,
    },
    #[command(about = "Delete the record with ID")]
    Delete { id: u64 },
    #[command(about = "Interactive session over a local list of records")]
    Shell,
    #[command(about = "Generate shell completions")]
    Completion { shell: Shell },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Get { .. } => "get",
            Command::Search { .. } => "search",
            Command::Add(_) => "add",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Shell => "shell",
            Command::Completion { .. } => "completion",
        }
    }
}

#[derive(Args, Debug, Clone)]
struct PopFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    number: Option<i64>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    shipping: Option<f64>,
    #[arg(long)]
    sold: bool,
    #[arg(long)]
    delivered: bool,
    #[arg(long, help = "Collection id")]
    collection: Option<u64>,
    #[arg(long, help = "Store id")]
    store: Option<u64>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    order_date: Option<String>,
}

impl PopFields {
    fn into_pop(self) -> Pop {
        Pop {
            id: None,
            name: self.name.trim().to_string(),
            number: self.number,
            price: self.price,
            shipping: self.shipping,
            sold: self.sold,
            delivered: self.delivered,
            collection: self.collection,
            store: self.store,
            image: self.image,
            order_date: self.order_date,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_json(value: &impl Serialize) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)
    })
}

/// Writes log lines from `start` on to stderr and returns the new cursor.
fn emit_messages(cmd: &str, messages: &MessageLog, start: usize) -> usize {
    let lines = messages.messages_since(start);
    let is_tty = io::stderr().is_terminal();
    for line in &lines {
        let notice = Notice::message(cmd, line.as_str()).at(notice_time_now());
        if is_tty {
            eprintln!("{}", notice_text(&notice));
        } else {
            let json = serde_json::to_string(&notice_json(&notice)).unwrap_or_else(|_| {
                "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}"
                    .to_string()
            });
            eprintln!("{json}");
        }
    }
    start + lines.len()
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    lines.join("\n")
}
