// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line structure for the inference runtime binary, parsed with
//! `clap`. Security validation of the parsed values happens in
//! [`super::validator`] after parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "inference-runtime")]
#[command(about = concat!("Local Inference Runtime v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// JSON configuration file path, layered under `EngineConfig::default()`
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the worker/session concurrency derived from CPU count
    #[arg(long)]
    pub cpu_threads: Option<usize>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the engine and serve inference requests until a shutdown
    /// signal arrives.
    Serve,

    /// Submit a single inference task and print the result once it
    /// completes.
    Infer {
        /// Path to a model artifact (.onnx/.gguf/.safetensors/.bin),
        /// recognized by extension for diagnostics only.
        #[arg(short, long)]
        model: PathBuf,

        /// Repeatable `key=value` input pairs.
        #[arg(short, long = "input", value_parser = parse_key_value)]
        inputs: Vec<(String, String)>,

        /// Scheduling priority: background, normal, or interactive.
        #[arg(long, default_value = "normal")]
        priority: String,

        /// Inference precision: fp32, fp16, or int8.
        #[arg(long, default_value = "fp32")]
        precision: String,

        /// Maximum time to wait for the result.
        #[arg(long, default_value = "30000")]
        timeout_ms: u64,
    },

    /// Print a one-shot hardware probe (CPU/GPU/NPU inventory and scores).
    Probe,

    /// Print the current engine statistics snapshot.
    Stats,

    /// Chunk a text file on the preprocessing worker pool and print the
    /// resulting chunks, one per line.
    Chunk {
        /// Text file to chunk.
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum characters per chunk before overlap is applied.
        #[arg(long, default_value = "512")]
        chunk_size: usize,

        /// Words of trailing overlap carried into the next chunk.
        #[arg(long, default_value = "50")]
        overlap_size: usize,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected key=value, got '{s}'")),
    }
}

/// Parses `std::env::args()` into a [`Cli`]. Clap handles `--help`/
/// `--version` and exits the process on parse failure.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pair() {
        assert_eq!(parse_key_value("prompt=hello").unwrap(), ("prompt".to_string(), "hello".to_string()));
    }

    #[test]
    fn rejects_pair_without_equals() {
        assert!(parse_key_value("prompt").is_err());
    }

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::parse_from(["inference-runtime", "serve"]);
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn parses_infer_subcommand_with_inputs() {
        let cli = Cli::parse_from([
            "inference-runtime",
            "infer",
            "--model",
            "model.onnx",
            "--input",
            "prompt=hello",
        ]);
        match cli.command {
            Commands::Infer { model, inputs, .. } => {
                assert_eq!(model, PathBuf::from("model.onnx"));
                assert_eq!(inputs, vec![("prompt".to_string(), "hello".to_string())]);
            }
            other => panic!("expected Infer, got {other:?}"),
        }
    }
}
