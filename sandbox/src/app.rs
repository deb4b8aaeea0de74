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

//! Wires the sample engines into a step graph and runs it.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use lumen_control::{NodeHandle, Sequencer, StepEdge, StepObject, Steps};
use lumen_core::Phase;

use crate::config::SandboxConfig;
use crate::engines::{
    CullingEngine, FrameEngine, GizmoEngine, GizmoToken, InputEngine, InputToken,
    PlayerController, RenderEngine,
};
use crate::scene::{FrameStats, Scene};

/// The headless testbed: a scene and the sequencer driving it.
pub struct Sandbox {
    sequencer: Sequencer<Scene>,
    scene: Scene,
}

impl Sandbox {
    /// Builds the scene and the step graph described by `config`.
    ///
    /// The graph has three nodes:
    /// - the root, visited once per phase, which runs the frame, input,
    ///   culling and render engines on their phases;
    /// - `InputConsumers`, where the input engine sends input tokens;
    /// - `Debug`, where the render engine sends gizmo tokens.
    pub fn new(config: &SandboxConfig) -> Result<Self> {
        let scene = Scene::populate(config)?;

        let root = NodeHandle::named("Root");
        let frame = Rc::new(RefCell::new(FrameEngine));
        let player = Rc::new(RefCell::new(PlayerController));
        let culling = Rc::new(RefCell::new(CullingEngine));
        let gizmos = Rc::new(RefCell::new(GizmoEngine));

        let input_node = NodeHandle::named("InputConsumers");
        let input = Rc::new(RefCell::new(InputEngine::new(input_node.clone())));
        let debug_node = NodeHandle::named("Debug");
        let render = Rc::new(RefCell::new(RenderEngine::new(debug_node.clone())));

        let frame_step = StepObject::<Scene>::builder(&frame).conditional::<()>().build();
        let input_step = StepObject::<Scene>::builder(&input).unconditional().build();
        let player_step = StepObject::<Scene>::builder(&player).token::<InputToken>().build();
        let culling_step = StepObject::<Scene>::builder(&culling).unconditional().build();
        let render_step = StepObject::<Scene>::builder(&render).unconditional().build();
        let gizmo_step = StepObject::<Scene>::builder(&gizmos).token::<GizmoToken>().build();

        let mut steps: Steps<Scene> = Steps::new();
        steps.insert(
            root.clone(),
            StepEdge::new()
                .on(Phase::InputUpdate, &input_step)
                .on(Phase::PreRender, &culling_step)
                .on(Phase::Render, &render_step)
                .always(&frame_step),
        );
        steps.insert(input_node, StepEdge::new().always(&player_step));
        steps.insert(debug_node, StepEdge::new().always(&gizmo_step));

        let mut sequencer = Sequencer::new();
        sequencer.set_steps(steps);
        sequencer.set_root(root);
        sequencer.set_root_sequence(config.root_sequence.iter().copied());

        Ok(Self { sequencer, scene })
    }

    /// Runs `ticks` frames. Stops at the first failing frame.
    pub fn run(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.sequencer.execute_root_sequence(&mut self.scene)?;
        }
        log::info!("Sandbox: ran {} ticks", self.sequencer.ticks());
        Ok(())
    }

    /// Tears the graph down and drops the scene's contents.
    pub fn shutdown(&mut self) {
        self.sequencer.release();
        self.scene.db.clear();
        log::info!("Sandbox: shut down");
    }

    pub fn stats(&self) -> FrameStats {
        self.scene.stats
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn sequencer(&self) -> &Sequencer<Scene> {
        &self.sequencer
    }
}
