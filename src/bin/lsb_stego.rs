//! # lsb-stego Command Line
//!
//! Thin wrapper that drives the codec from the shell.
//!
//! ## Usage
//!
//! ```bash
//! # Hide a message; the key is printed and optionally saved
//! cargo run --bin lsb-stego -- encode --image cover.png --output secret.png \
//!   --message "meet at dawn" --key-output secret.key
//!
//! # Hide a file as raw bytes, with a JSON report of codec events
//! cargo run --bin lsb-stego -- encode --image cover.png --output secret.png \
//!   --message-file notes.pdf --binary --report report.json
//!
//! # Recover it
//! cargo run --bin lsb-stego -- decode --image secret.png --key-file secret.key
//! ```
//!
//! Codec settings come from `--config` (TOML, see `config/codec.toml`) and can
//! be overridden with `--max-depth` and `--delimiter`.

use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use lsb_stego::diagnostics::{Diagnostics, EventLog, LogDiagnostics, StegoEvent};
use lsb_stego::processing::{load_carrier, save_stego};
use lsb_stego::{CodecConfig, Message, SecretKey, StegoCodec};

/// Command-line arguments for the lsb-stego binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a codec configuration file (TOML format)
    ///
    /// Example: config/codec.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Largest number of low bits per channel the encoder may use (1-8)
    #[arg(long, global = true)]
    max_depth: Option<u8>,

    /// Character terminating the embedded length field
    #[arg(long, global = true)]
    delimiter: Option<char>,

    /// Log codec internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a message inside a lossless image
    Encode(EncodeArgs),
    /// Recover a message from a stego image
    Decode(DecodeArgs),
}

#[derive(ClapArgs, Debug)]
struct EncodeArgs {
    /// Carrier image (PNG, BMP, TIFF, TGA, PNM or QOI)
    #[arg(short, long)]
    image: PathBuf,

    /// Where to write the stego image; the extension picks the format
    #[arg(short, long)]
    output: PathBuf,

    /// Message text
    #[arg(short, long, conflicts_with = "message_file", required_unless_present = "message_file")]
    message: Option<String>,

    /// Read the message from a file instead
    #[arg(long)]
    message_file: Option<PathBuf>,

    /// Treat the message file as raw bytes rather than UTF-8 text
    #[arg(long, requires = "message_file")]
    binary: bool,

    /// Also write the secret key to this file
    #[arg(long)]
    key_output: Option<PathBuf>,

    /// Write the codec events of this run as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct DecodeArgs {
    /// Stego image
    #[arg(short, long)]
    image: PathBuf,

    /// Secret key token
    #[arg(short, long, conflicts_with = "key_file", required_unless_present = "key_file")]
    key: Option<String>,

    /// Read the secret key token from a file
    #[arg(long)]
    key_file: Option<PathBuf>,

    /// Write the recovered message here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Forwards events to the log and keeps a copy for `--report`.
struct ReportingDiagnostics {
    log: LogDiagnostics,
    events: Arc<EventLog>,
}

impl Diagnostics for ReportingDiagnostics {
    fn record(&self, event: &StegoEvent) {
        self.log.record(event);
        self.events.record(event);
    }
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Logs go to stderr so a decoded message on stdout stays clean.
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger(verbose: bool) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();
}

fn load_codec_config(args: &Args) -> anyhow::Result<CodecConfig> {
    let mut config = match &args.config {
        Some(path) => CodecConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CodecConfig::default(),
    };

    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }

    config.validate()?;
    Ok(config)
}

fn run_encode(codec: StegoCodec, args: EncodeArgs) -> anyhow::Result<()> {
    let message = match (args.message, &args.message_file) {
        (Some(text), _) => Message::Text(text),
        (None, Some(path)) if args.binary => Message::Binary(
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?,
        ),
        (None, Some(path)) => Message::Text(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {} as UTF-8 text", path.display()))?,
        ),
        (None, None) => bail!("either --message or --message-file is required"),
    };

    let events = Arc::new(EventLog::new());
    let codec = codec.with_diagnostics(Arc::new(ReportingDiagnostics {
        log: LogDiagnostics,
        events: events.clone(),
    }));

    let carrier = load_carrier(&args.image)?;
    let encoded = codec.encode(&carrier, &message)?;
    save_stego(&encoded.image, &args.output)?;
    info!(
        "Message embedded at depth {} into {}",
        encoded.depth,
        args.output.display()
    );

    let token = encoded.key.to_token();
    if let Some(path) = &args.key_output {
        fs::write(path, &token).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Secret key written to {}", path.display());
    }
    println!("{}", token);

    if let Some(path) = &args.report {
        events.export_to_json(path)?;
        info!("Report exported to {}", path.display());
    }

    Ok(())
}

fn run_decode(codec: StegoCodec, args: DecodeArgs) -> anyhow::Result<()> {
    let token = match (args.key, &args.key_file) {
        (Some(token), _) => token,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("either --key or --key-file is required"),
    };
    let key = SecretKey::from_token(&token)?;

    let stego = load_carrier(&args.image)?;
    let message = codec.decode(&stego, &key)?;

    match (message, &args.output) {
        (message, Some(path)) => {
            fs::write(path, message.into_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Recovered message written to {}", path.display());
        }
        (Message::Text(text), None) => println!("{}", text),
        (Message::Binary(_), None) => {
            bail!("recovered message is binary; pass --output to save it")
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging
    init_logger(args.verbose);

    let config = load_codec_config(&args)?;
    let codec = StegoCodec::new(config)?;

    match args.command {
        Command::Encode(encode) => run_encode(codec, encode),
        Command::Decode(decode) => run_decode(codec, decode),
    }
}
