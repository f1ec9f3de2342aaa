use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use sov_celestia_blob::{from_toml_path, BlobCommitter, BlobConfig, MsgPayForBlobs, PreparedBlob};
use tracing_subscriber::EnvFilter;

/// Computes the share commitment of a blob and prints the messages paying for it.
#[derive(Debug, Parser)]
struct Args {
    /// Namespace as hex: up to 56 characters of id, or 58 with the version byte
    #[clap(short, long)]
    namespace: String,
    /// Bech32 address of the account paying for the blob
    #[clap(short, long)]
    signer: String,
    /// File holding the raw blob payload
    #[clap(short, long, conflicts_with = "data", required_unless_present = "data")]
    input: Option<PathBuf>,
    /// Blob payload as hex
    #[clap(short, long)]
    data: Option<String>,
    /// TOML file overriding the protocol parameters
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Hex encoded signed transaction to wrap in the blob envelope
    #[clap(long)]
    signed_tx: Option<String>,
    /// Also print the proto3 JSON view of the MsgPayForBlobs
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    prepared: &'a PreparedBlob,
    #[serde(skip_serializing_if = "Option::is_none")]
    signed_blob_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a MsgPayForBlobs>,
}

fn decode_hex_arg(value: &str) -> anyhow::Result<Vec<u8>> {
    let value = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    Ok(hex::decode(value)?)
}

/// Prepares the blob described by `args` and renders the result as JSON.
fn run(args: &Args) -> anyhow::Result<String> {
    let config: BlobConfig = match &args.config {
        Some(path) => from_toml_path(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?,
        None => BlobConfig::default(),
    };
    let committer = BlobCommitter::new(config);

    let payload = match (&args.input, &args.data) {
        (Some(path), _) => std::fs::read(path)
            .with_context(|| format!("Failed to read blob from {}", path.display()))?,
        (None, Some(data)) => decode_hex_arg(data).context("Blob data is not valid hex")?,
        (None, None) => anyhow::bail!("Either --input or --data must be provided"),
    };

    let prepared = committer.build_commitment(&args.signer, &args.namespace, payload)?;

    let signed_blob_tx = match &args.signed_tx {
        Some(tx) => {
            let tx = decode_hex_arg(tx).context("Signed transaction is not valid hex")?;
            Some(hex::encode(prepared.blob_tx_with(&tx)))
        }
        None => None,
    };
    let output = Output {
        prepared: &prepared,
        signed_blob_tx,
        message: args.json.then(|| prepared.message()),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so that stdout only carries the JSON result
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global default subscriber")?;

    println!("{}", run(&args)?);
    Ok(())
}
