// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Testbed configuration, read from a RON file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lumen_core::Phase;
use serde::{Deserialize, Serialize};

/// Everything the testbed reads at startup.
///
/// Missing fields take their default, so a config file only needs the values
/// it overrides:
///
/// ```ron
/// (
///     ticks: 120,
///     active_meshes: 5000,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Number of frames to run before shutting down.
    pub ticks: u64,
    /// Phases every frame walks, in order.
    pub root_sequence: Vec<Phase>,
    /// Mesh entities placed in the active group.
    pub active_meshes: u32,
    /// Mesh entities placed in the inactive group.
    pub inactive_meshes: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            ticks: 60,
            root_sequence: Phase::DEFAULT_SEQUENCE.to_vec(),
            active_meshes: 1_000,
            inactive_meshes: 250,
        }
    }
}

impl SandboxConfig {
    /// Parses a config from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).context("invalid sandbox config")
    }

    /// Reads the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Resolves the config from an optional command-line path.
    ///
    /// No path, or a path that does not exist, gives the defaults. A file that
    /// exists but does not parse is an error.
    pub fn from_arg(path: Option<&str>) -> Result<Self> {
        let Some(path) = path.map(Path::new) else {
            log::info!("Sandbox: no config given, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            log::warn!("Sandbox: config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        log::info!("Sandbox: loaded config {}", path.display());
        Ok(config)
    }
}
