// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernel runtime configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! num_threads = 4
//! activation = "relu"
//! enable_profiling = true
//! ```

use crate::{kernels::ActivationKind, LayerError};
use std::path::Path;

/// Configuration for the kernel runtime.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KernelConfig {
    /// Number of worker threads (defaults to the number of online CPU cores).
    pub num_threads: Option<usize>,
    /// Feed-forward activation name: `"relu"` or `"gelu"`.
    #[serde(default = "default_activation")]
    pub activation: String,
    /// Whether pipeline invocations should be bracketed by a recording
    /// profiler rather than the no-op hooks.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_activation() -> String {
    "relu".to_string()
}

fn default_true() -> bool {
    true
}

impl KernelConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LayerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LayerError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, LayerError> {
        toml::from_str(toml_str)
            .map_err(|e| LayerError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, LayerError> {
        toml::to_string_pretty(self)
            .map_err(|e| LayerError::Config(format!("TOML serialise error: {e}")))
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Parses the configured activation name.
    pub fn parse_activation(&self) -> Result<ActivationKind, LayerError> {
        match self.activation.to_lowercase().as_str() {
            "relu" => Ok(ActivationKind::Relu),
            "gelu" => Ok(ActivationKind::Gelu),
            other => Err(LayerError::Config(format!(
                "unknown activation '{other}'; expected 'relu' or 'gelu'"
            ))),
        }
    }

    /// Builds a dedicated rayon pool with the resolved thread count.
    ///
    /// Kernels parallelize on the ambient pool, so callers wanting a fixed
    /// worker count run invocations inside `pool.install(|| ...)`.
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool, LayerError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.resolve_threads())
            .build()
            .map_err(|e| LayerError::Config(format!("cannot build thread pool: {e}")))
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            activation: default_activation(),
            enable_profiling: true,
        }
    }
}
