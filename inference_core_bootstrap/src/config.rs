// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration Loading
//!
//! Reads an [`EngineConfig`] from an optional JSON file and layers CLI
//! overrides (thread counts) on top, then validates the result before
//! handing it to [`inference_core::application::InferenceEngine::new`].

use std::path::Path;

use inference_core::EngineConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] inference_core::InferenceError),
}

/// Loads the engine configuration: a JSON file if given, otherwise
/// `EngineConfig::default()`, then applies the `max_workers` override from
/// `--cpu-threads` if present. Validates before returning.
pub fn load_engine_config(config_path: Option<&Path>, cpu_threads: Option<usize>) -> Result<EngineConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => read_config_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(threads) = cpu_threads {
        config.max_workers = threads;
    }

    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_without_a_config_file() {
        let config = load_engine_config(None, None).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn cpu_threads_override_applies_after_load() {
        let config = load_engine_config(None, Some(2)).unwrap();
        assert_eq!(config.max_workers, 2);
    }

    #[test]
    fn missing_file_surfaces_a_read_error() {
        let result = load_engine_config(Some(Path::new("/nonexistent/engine.json")), None);
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
