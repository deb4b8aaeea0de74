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

//! Sample engines that exercise every capability of the step graph.

use anyhow::Context;
use lumen_control::{
    ConditionalStep, Dispatch, NodeHandle, StepResult, TokenStep, UnconditionalStep,
};
use lumen_core::{Condition, Phase};

use crate::scene::{MeshImplementer, MeshRenderableView, Scene, ACTIVE};

/// Opens and closes frames. Reacts to the phase condition of a unit visit.
#[derive(Debug, Default)]
pub struct FrameEngine;

impl ConditionalStep<(), Scene> for FrameEngine {
    fn step_when(
        &mut self,
        dispatch: &mut Dispatch<'_, Scene>,
        _token: &(),
        condition: Condition,
    ) -> StepResult {
        let stats = &mut dispatch.context().stats;
        match Phase::from_condition(condition) {
            Some(Phase::OpenFrame) => {
                stats.frames_opened += 1;
                log::trace!("FrameEngine: frame {} opened", stats.frames_opened);
            }
            Some(Phase::CloseFrame) => stats.frames_closed += 1,
            _ => {}
        }
        Ok(())
    }
}

/// A synthetic input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputToken {
    pub key: u32,
}

/// Polls a fake device and fans each event out to its consumers.
#[derive(Debug)]
pub struct InputEngine {
    consumers: NodeHandle,
    polled: u32,
}

impl InputEngine {
    pub fn new(consumers: NodeHandle) -> Self {
        Self {
            consumers,
            polled: 0,
        }
    }
}

impl UnconditionalStep<Scene> for InputEngine {
    fn step(&mut self, dispatch: &mut Dispatch<'_, Scene>) -> StepResult {
        self.polled = self.polled.wrapping_add(1);
        let token = InputToken {
            key: self.polled % 104,
        };
        let condition = dispatch.condition();
        dispatch.next(&self.consumers, &token, condition)?;
        Ok(())
    }
}

/// Consumes input tokens.
#[derive(Debug, Default)]
pub struct PlayerController;

impl TokenStep<InputToken, Scene> for PlayerController {
    fn step_with(&mut self, dispatch: &mut Dispatch<'_, Scene>, token: &InputToken) -> StepResult {
        let stats = &mut dispatch.context().stats;
        stats.inputs_consumed += 1;
        stats.last_key = Some(token.key);
        Ok(())
    }
}

/// Marks every mesh of the active group visible and every other mesh hidden.
#[derive(Debug, Default)]
pub struct CullingEngine;

impl UnconditionalStep<Scene> for CullingEngine {
    fn step(&mut self, dispatch: &mut Dispatch<'_, Scene>) -> StepResult {
        let (implementers, views) = dispatch.context().db.split_mut();
        if implementers.count::<MeshImplementer>() == 0 {
            return Ok(());
        }
        for mesh in implementers.buckets_mut::<MeshImplementer>()?.iter_mut() {
            mesh.visible = false;
        }

        // An empty active group has no view buffer yet.
        if views.count::<MeshRenderableView>(ACTIVE) == 0 {
            return Ok(());
        }
        for view in views.query::<MeshRenderableView>(ACTIVE)? {
            implementers
                .get_mut(view.mesh)
                .with_context(|| format!("culling {}", view.egid))?
                .visible = true;
        }
        Ok(())
    }
}

/// Tells the debug layer how many gizmos to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GizmoToken {
    pub count: usize,
}

/// Counts visible meshes and hands them to the debug layer.
#[derive(Debug)]
pub struct RenderEngine {
    debug: NodeHandle,
}

impl RenderEngine {
    pub fn new(debug: NodeHandle) -> Self {
        Self { debug }
    }
}

impl UnconditionalStep<Scene> for RenderEngine {
    fn step(&mut self, dispatch: &mut Dispatch<'_, Scene>) -> StepResult {
        let scene = dispatch.context();
        let visible = if scene.db.implementers().count::<MeshImplementer>() == 0 {
            0
        } else {
            scene
                .db
                .implementers_of::<MeshImplementer>()?
                .iter()
                .filter(|mesh| mesh.visible)
                .count()
        };
        scene.stats.visible_meshes = visible;

        let condition = dispatch.condition();
        dispatch.next(&self.debug, &GizmoToken { count: visible }, condition)?;
        Ok(())
    }
}

/// Draws one gizmo per visible mesh.
#[derive(Debug, Default)]
pub struct GizmoEngine;

impl TokenStep<GizmoToken, Scene> for GizmoEngine {
    fn step_with(&mut self, dispatch: &mut Dispatch<'_, Scene>, token: &GizmoToken) -> StepResult {
        dispatch.context().stats.gizmos_drawn += token.count as u64;
        Ok(())
    }
}
