//! `pinseal`: seal pin documents for a recipient and open them again.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pinseal_crypto::{ContentEncryption, KeyFormat};
use pinseal_transport::files::write_atomic;
use pinseal_transport::{PinsealConfig, fetch_and_open, open_token_file, seal_json_file};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pinseal", version, about = "Encrypt and decrypt SSL pinning configuration")]
struct Cli {
    /// JSON config file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Key encoding (pem or jwk); inferred from the key file name by default.
    #[arg(long, global = true, value_parser = parse_key_format)]
    key_format: Option<KeyFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seal a JSON pin document for a recipient public key.
    Seal {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        public_key: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Content encryption: A256GCM or A128CBC-HS256.
        #[arg(long, value_parser = parse_enc)]
        enc: Option<ContentEncryption>,
    },
    /// Open a sealed token file.
    Open {
        #[arg(long)]
        token: Option<PathBuf>,
        #[arg(long)]
        private_key: Option<PathBuf>,
        /// Write the JSON here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch a sealed token over HTTPS and open it.
    Fetch {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        private_key: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn parse_key_format(s: &str) -> Result<KeyFormat, String> {
    s.parse().map_err(|e: pinseal_crypto::CryptoError| e.to_string())
}

fn parse_enc(s: &str) -> Result<ContentEncryption, String> {
    s.parse().map_err(|e: pinseal_crypto::CryptoError| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PinsealConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PinsealConfig::default(),
    };
    if cli.key_format.is_some() {
        config.key_format = cli.key_format;
    }

    match cli.command {
        Command::Seal { input, public_key, output, enc } => {
            override_with(&mut config.input_path, input);
            override_with(&mut config.public_key_path, public_key);
            override_with(&mut config.output_path, output);
            override_with(&mut config.content_encryption, enc);

            let summary = seal_json_file(&config).context("failed to seal pin document")?;
            println!(
                "sealed {} ({} characters, {})",
                summary.output_path.display(),
                summary.token_len,
                summary.content_encryption
            );
        }
        Command::Open { token, private_key, output } => {
            if private_key.is_some() {
                config.private_key_path = private_key;
            }
            let token = token.unwrap_or_else(|| config.output_path.clone());
            let document =
                open_token_file(&config, &token).context("failed to open sealed pin document")?;
            emit(&document, output.as_deref())?;
        }
        Command::Fetch { url, private_key, output } => {
            if url.is_some() {
                config.remote_url = url;
            }
            if private_key.is_some() {
                config.private_key_path = private_key;
            }
            config.validate()?;
            let document = fetch_and_open(&config)
                .await
                .context("failed to fetch sealed pin document")?;
            emit(&document, output.as_deref())?;
        }
    }
    Ok(())
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn emit(document: &serde_json::Value, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_atomic(path, &serde_json::to_vec(document)?)?;
        }
        None => println!("{}", serde_json::to_string_pretty(document)?),
    }
    Ok(())
}
