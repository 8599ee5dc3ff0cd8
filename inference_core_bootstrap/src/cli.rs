// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse_cli()             │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

use inference_core::{Precision, Priority};

/// Validated CLI configuration
///
/// This structure holds all CLI arguments after security validation.
/// All paths are canonicalized and all values are range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub cpu_threads: Option<usize>,
}

/// Validated command variants
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Serve,
    Infer {
        model: PathBuf,
        inputs: Vec<(String, String)>,
        priority: Priority,
        precision: Precision,
        timeout_ms: u64,
    },
    Probe,
    Stats,
    Chunk {
        file: PathBuf,
        chunk_size: usize,
        overlap_size: usize,
    },
}

/// Parse and validate CLI arguments
///
/// This function combines parsing and validation:
/// 1. Parse CLI with clap
/// 2. Validate all paths with SecureArgParser
/// 3. Validate all numeric values
/// 4. Return ValidatedCli on success
///
/// # Errors
///
/// Returns `ParseError` if any validation fails
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn parse_priority(value: &str) -> Result<Priority, ParseError> {
    match value.to_lowercase().as_str() {
        "background" => Ok(Priority::BACKGROUND),
        "normal" => Ok(Priority::NORMAL),
        "interactive" => Ok(Priority::INTERACTIVE),
        other => Err(ParseError::InvalidValue {
            arg: "priority".to_string(),
            reason: format!("must be background, normal, or interactive, got '{other}'"),
        }),
    }
}

fn parse_precision(value: &str) -> Result<Precision, ParseError> {
    match value.to_lowercase().as_str() {
        "fp32" => Ok(Precision::Fp32),
        "fp16" => Ok(Precision::Fp16),
        "int8" => Ok(Precision::Int8),
        other => Err(ParseError::InvalidValue {
            arg: "precision".to_string(),
            reason: format!("must be fp32, fp16, or int8, got '{other}'"),
        }),
    }
}

/// Validate parsed CLI arguments
///
/// Applies security validation to all CLI arguments: path canonicalization
/// and security checks, numeric range validation, and priority/precision
/// parsing into domain value objects.
///
/// # Errors
///
/// Returns `ParseError` if any validation fails
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        Some(SecureArgParser::validate_path(&path.to_string_lossy())?)
    } else {
        None
    };

    if let Some(threads) = cli.cpu_threads {
        if threads == 0 || threads > 128 {
            return Err(ParseError::InvalidValue {
                arg: "cpu-threads".to_string(),
                reason: "must be between 1 and 128".to_string(),
            });
        }
    }

    let command = match cli.command {
        Commands::Serve => ValidatedCommand::Serve,
        Commands::Infer {
            model,
            inputs,
            priority,
            precision,
            timeout_ms,
        } => {
            if timeout_ms == 0 {
                return Err(ParseError::InvalidValue {
                    arg: "timeout-ms".to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }

            let validated_model = SecureArgParser::validate_path(&model.to_string_lossy())?;

            for (key, value) in &inputs {
                SecureArgParser::validate_argument(key)?;
                SecureArgParser::validate_argument(value)?;
            }

            ValidatedCommand::Infer {
                model: validated_model,
                inputs,
                priority: parse_priority(&priority)?,
                precision: parse_precision(&precision)?,
                timeout_ms,
            }
        }
        Commands::Probe => ValidatedCommand::Probe,
        Commands::Stats => ValidatedCommand::Stats,
        Commands::Chunk {
            file,
            chunk_size,
            overlap_size,
        } => {
            let validated_file = SecureArgParser::validate_path(&file.to_string_lossy())?;

            if chunk_size == 0 {
                return Err(ParseError::InvalidValue {
                    arg: "chunk-size".to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }

            ValidatedCommand::Chunk {
                file: validated_file,
                chunk_size,
                overlap_size,
            }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
        cpu_threads: cli.cpu_threads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_cpu_threads() {
        let cli = Cli {
            command: Commands::Serve,
            verbose: false,
            config: None,
            cpu_threads: Some(0),
        };
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_unknown_priority_label() {
        assert!(matches!(parse_priority("urgent"), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_unknown_precision_label() {
        assert!(matches!(parse_precision("bf16"), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn serve_command_validates_with_no_paths() {
        let cli = Cli {
            command: Commands::Serve,
            verbose: true,
            config: None,
            cpu_threads: None,
        };
        let validated = validate_cli(cli).unwrap();
        assert!(matches!(validated.command, ValidatedCommand::Serve));
        assert!(validated.verbose);
    }

    #[test]
    fn rejects_zero_timeout() {
        let cli = Cli {
            command: Commands::Infer {
                model: PathBuf::from("model.onnx"),
                inputs: vec![],
                priority: "normal".to_string(),
                precision: "fp32".to_string(),
                timeout_ms: 0,
            },
            verbose: false,
            config: None,
            cpu_threads: None,
        };
        assert!(matches!(validate_cli(cli), Err(ParseError::InvalidValue { .. })));
    }
}
