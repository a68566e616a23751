// src/engine.rs
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use crate::bencode::{bvalue_to_json, decode_bencode_with, encode_bvalue};
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::torrent::Torrent;

#[derive(Debug, Parser)]
#[command(name = "rusbit-bencode", about = "Decode and encode bencode data")]
pub struct Cli {
    /// Decoder policy file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a bencoded string and print it as JSON
    Decode { bencoded: String },
    /// Print the metadata of a single-file .torrent
    Info { torrent: PathBuf },
    /// Re-encode a file canonically and report whether it already was
    Canonical {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn use_command(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let options = config.decoder_options();

    match cli.command {
        Command::Decode { bencoded } => {
            let value = decode_bencode_with(bencoded.as_bytes(), &options)?;
            println!("{}", serde_json::to_string(&bvalue_to_json(&value))?);
        }
        Command::Info { torrent } => {
            let buf = fs::read(&torrent)
                .with_context(|| format!("reading {}", torrent.display()))?;
            let torrent = Torrent::from_bytes(&buf, &options)?;

            println!("Tracker URL: {}", torrent.announce);
            println!("File Name: {}", torrent.info.name);
            println!("Length: {}", torrent.info.length);
            println!("Info Hash: {}", hex::encode(torrent.info_hash));
            println!("Piece Length: {}", torrent.info.piece_length);
            println!("Number of Pieces: {}", torrent.info.pieces.len());
            println!("Piece Hashes:");
            for piece_hash in &torrent.info.pieces {
                println!("{}", hex::encode(piece_hash));
            }
        }
        Command::Canonical { input, output } => {
            let buf = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let value = decode_bencode_with(&buf, &options)?;
            let canonical = encode_bvalue(&value);

            if canonical == buf {
                println!("{}: canonical", input.display());
            } else {
                println!(
                    "{}: not canonical ({} bytes, canonical form {} bytes)",
                    input.display(),
                    buf.len(),
                    canonical.len()
                );
            }

            if let Some(output) = output {
                fs::write(&output, &canonical)
                    .with_context(|| format!("writing {}", output.display()))?;
                info!("Wrote {} bytes to {}", canonical.len(), output.display());
            }
        }
    }

    Ok(())
}
