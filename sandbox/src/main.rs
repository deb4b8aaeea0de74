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

// Lumen Sandbox
// Headless testbed: builds a mesh scene and runs the frame loop over it.

mod app;
mod config;
mod engines;
mod scene;

use anyhow::Result;

use crate::app::Sandbox;
use crate::config::SandboxConfig;

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = SandboxConfig::from_arg(std::env::args().nth(1).as_deref())?;
    let mut sandbox = Sandbox::new(&config)?;
    log::debug!("Sandbox: {} nodes wired", sandbox.sequencer().node_count());
    sandbox.run(config.ticks)?;
    log::info!("Sandbox: {}", sandbox.scene().db.stats());
    log::info!("Sandbox: {}", sandbox.stats());
    sandbox.shutdown();
    Ok(())
}
