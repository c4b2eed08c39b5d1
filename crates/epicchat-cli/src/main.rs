use std::env;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use epicchat_contracts::chat::{
    parse_chat_input, ChatInput, Command as ChatCommand, MediaType, CHAT_HELP_COMMANDS,
};
use epicchat_contracts::export::{ExportDocument, ExportFormat};
use epicchat_contracts::history::Message;
use epicchat_engine::{
    ChatSession, Delivery, FileStore, NoSpeech, PersistenceStore, ReplyPolicy, SessionConfig,
    SpeechInput, TranscriptFile,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const STORE_ENV: &str = "EPICCHAT_STORE";
const EVENTS_ENV: &str = "EPICCHAT_EVENTS";
const DEFAULT_STORE_DIR: &str = ".epicchat";
const DEFAULT_HISTORY_COUNT: usize = 20;

#[derive(Debug, Parser)]
#[command(name = "epicchat", version, about = "Chat with your EpicChat avatar")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat(ChatArgs),
    Send(SendArgs),
    Export(ExportArgs),
}

#[derive(Debug, Parser)]
struct StoreArgs {
    /// Directory holding the persisted records. Falls back to $EPICCHAT_STORE.
    #[arg(long)]
    store: Option<PathBuf>,
    /// JSONL session event log. Falls back to $EPICCHAT_EVENTS.
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long, default_value = "overlap")]
    policy: String,
    /// File of transcripts, one per line, consumed by /mic.
    #[arg(long)]
    transcripts: Option<PathBuf>,
    /// Deliver replies without the thinking/generating delays.
    #[arg(long)]
    immediate: bool,
}

#[derive(Debug, Parser)]
struct SendArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long)]
    message: String,
    #[arg(long)]
    immediate: bool,
}

#[derive(Debug, Parser)]
struct ExportArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long, default_value = "text")]
    format: String,
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("epicchat error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("epicchat=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Send(args) => run_send(args),
        Command::Export(args) => run_export(args),
    }
}

fn open_session(store: &StoreArgs, config: SessionConfig) -> ChatSession {
    let dir = resolve_path(store.store.clone(), STORE_ENV)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
    tracing::debug!(store = %dir.display(), "opening chat store");
    let session = ChatSession::open(PersistenceStore::new(FileStore::new(dir)), config);
    match resolve_path(store.events.clone(), EVENTS_ENV) {
        Some(events) => session.with_event_log(events),
        None => session,
    }
}

fn resolve_path(flag: Option<PathBuf>, env_key: &str) -> Option<PathBuf> {
    flag.or_else(|| {
        env::var(env_key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

fn session_config(policy: &str, immediate: bool) -> Result<SessionConfig> {
    let Some(reply_policy) = ReplyPolicy::parse(policy) else {
        bail!("unknown reply policy '{policy}' (expected overlap or supersede)");
    };
    let base = if immediate {
        SessionConfig::immediate()
    } else {
        SessionConfig::default()
    };
    Ok(SessionConfig {
        reply_policy,
        ..base
    })
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let config = session_config(&args.policy, args.immediate)?;
    let mut session = open_session(&args.store, config);
    let mut speech: Box<dyn SpeechInput> = match &args.transcripts {
        Some(path) => Box::new(TranscriptFile::open(path)?),
        None => Box::new(NoSpeech),
    };

    println!(
        "{} is ready. Type /help for commands.",
        session.avatar().name
    );
    for message in session.history().recent(DEFAULT_HISTORY_COUNT) {
        println!("{}", render_message(message, &session));
    }

    let lines = spawn_stdin_reader();
    let mut input_open = true;
    prompt()?;

    loop {
        let deliveries = session.poll(Instant::now());
        if !deliveries.is_empty() {
            print_deliveries(&deliveries, &session);
            prompt()?;
        }

        let wait = session
            .next_due()
            .map(|due| due.saturating_duration_since(Instant::now()));

        if !input_open {
            match wait {
                Some(wait) => {
                    thread::sleep(wait);
                    continue;
                }
                None => break,
            }
        }

        let received = match wait {
            Some(wait) => lines.recv_timeout(wait),
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Ok(line)) => {
                handle_line(&mut session, speech.as_mut(), &line)?;
                prompt()?;
            }
            Ok(Err(err)) => return Err(err).context("failed to read chat input"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => input_open = false,
        }
    }

    println!();
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        loop {
            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    let _ = tx.send(Err(err));
                    break;
                }
            }
        }
    });
    rx
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn handle_line(session: &mut ChatSession, speech: &mut dyn SpeechInput, line: &str) -> Result<()> {
    let input = line.trim_end_matches(['\n', '\r']);
    let command = match parse_chat_input(input) {
        ChatInput::Noop => return Ok(()),
        ChatInput::Message(text) => {
            let appended = session.send(&text, Instant::now());
            print_replies(&appended, session);
            return Ok(());
        }
        ChatInput::Command(command) => command,
    };

    match command.action.as_str() {
        "help" => {
            println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
        }
        "regenerate" => match session.regenerate(Instant::now()) {
            Some(message) => println!("{}", render_message(&message, session)),
            None => println!("Nothing to regenerate yet. Ask for some media first."),
        },
        "listen" => {
            let appended = session.listen(speech, Instant::now());
            print_all(&appended, session);
        }
        "toggle_theme" => {
            let theme = session.toggle_theme();
            println!("Theme set to {theme}");
        }
        "reset_preferences" => {
            session.reset_preferences();
            println!("Preferences reset to defaults.");
        }
        "show_preferences" => {
            for (key, value) in session.preferences().entries() {
                println!("{key}: {}", display_value(&value));
            }
        }
        "history" => {
            let count = history_count(command.args.get("count"));
            for message in session.history().recent(count) {
                println!("{}", render_message(message, session));
            }
        }
        "suggest_media" => {
            let media_type = command.arg_str("media_type").unwrap_or_default();
            match session.suggest_media(media_type) {
                Some(message) => println!("{}", render_message(&message, session)),
                None => println!("/media expects one of: {}", media_type_names()),
            }
        }
        "export" => {
            let format = ExportFormat::parse(command.arg_str("format").unwrap_or("text"));
            let outcome = session.export(format, Local::now());
            if let Some(document) = &outcome.document {
                let path = write_export(document, Path::new("."))?;
                println!("Wrote {}", path.display());
            }
            println!("{}", render_message(&outcome.message, session));
        }
        "set_avatar_name" => match non_empty_arg(&command, "name") {
            Some(name) => {
                let message = session.save_avatar(Some(name), None);
                println!("{}", render_message(&message, session));
            }
            None => println!("/name requires a name"),
        },
        "set_avatar_image" => match non_empty_arg(&command, "image") {
            Some(image) => {
                let message = session.save_avatar(None, Some(image));
                println!("{}", render_message(&message, session));
            }
            None => println!("/image requires an image reference"),
        },
        "set_preference" => {
            let key = command.arg_str("key").unwrap_or_default();
            let value = command.arg_str("value").unwrap_or_default();
            if key.is_empty() {
                println!("/set requires a preference key and value");
            } else {
                match session.set_preference(key, value) {
                    Ok(message) => println!("{}", render_message(&message, session)),
                    Err(err) => println!("Preference not changed: {err:#}"),
                }
            }
        }
        "unknown" => {
            let name = command.arg_str("command").unwrap_or_default();
            println!("Unknown command: /{name}. Type /help for commands.");
        }
        other => {
            tracing::warn!(action = other, "unhandled chat action");
        }
    }
    Ok(())
}

fn run_send(args: SendArgs) -> Result<i32> {
    let mut session = open_session(&args.store, session_config("overlap", args.immediate)?);
    let appended = session.send(&args.message, Instant::now());
    if appended.is_empty() {
        bail!("message is empty");
    }
    print_replies(&appended, &session);

    while let Some(due) = session.next_due() {
        thread::sleep(due.saturating_duration_since(Instant::now()));
        let deliveries = session.poll(Instant::now());
        print_deliveries(&deliveries, &session);
    }
    Ok(0)
}

fn run_export(args: ExportArgs) -> Result<i32> {
    let mut session = open_session(&args.store, SessionConfig::default());
    let outcome = session.export(ExportFormat::parse(&args.format), Local::now());
    let Some(document) = outcome.document else {
        println!("{}", outcome.message.content);
        return Ok(1);
    };
    let path = write_export(&document, &args.out)?;
    println!("Wrote {} ({})", path.display(), document.mime_type());
    Ok(0)
}

fn write_export(document: &ExportDocument, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join(&document.file_name);
    fs::write(&path, &document.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn non_empty_arg<'a>(command: &'a ChatCommand, key: &str) -> Option<&'a str> {
    command
        .arg_str(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn media_type_names() -> String {
    MediaType::ALL
        .iter()
        .map(|media_type| media_type.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn print_deliveries(deliveries: &[Delivery], session: &ChatSession) {
    for delivery in deliveries {
        if let Delivery::Artifact {
            media_type,
            content,
            ..
        } = delivery
        {
            print_artifact(*media_type, content);
        }
        println!("{}", render_message(delivery.message(), session));
    }
}

fn print_artifact(media_type: Option<MediaType>, content: &str) {
    match media_type {
        Some(MediaType::Code) => {
            println!("--- code ---");
            println!("{}", content.trim_end());
            println!("------------");
        }
        Some(media_type) => println!("[{media_type}] {content}"),
        None => println!("[media preview not available]"),
    }
}

/// Print assistant messages; the user's own lines were already typed.
fn print_replies(messages: &[Message], session: &ChatSession) {
    for message in messages.iter().filter(|message| !message.is_user()) {
        println!("{}", render_message(message, session));
    }
}

fn print_all(messages: &[Message], session: &ChatSession) {
    for message in messages {
        println!("{}", render_message(message, session));
    }
}

/// Counts beyond the address space saturate; the log is bounded anyway.
fn history_count(arg: Option<&Value>) -> usize {
    arg.and_then(Value::as_u64)
        .map(|count| usize::try_from(count).unwrap_or(usize::MAX))
        .unwrap_or(DEFAULT_HISTORY_COUNT)
}

fn render_message(message: &Message, session: &ChatSession) -> String {
    let speaker = if message.is_user() {
        "You"
    } else {
        session.avatar().name.as_str()
    };
    if session.preferences().show_timestamps {
        format!("[{}] {speaker}: {}", message.timestamp, message.content)
    } else {
        format!("{speaker}: {}", message.content)
    }
}
