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

//! The testbed scene: entity shapes, groups, and the context every engine sees.

use std::fmt;

use anyhow::Result;
use lumen_core::{EntityView, Egid, GroupId, Implementer};
use lumen_data::{EntityDatabase, ImplementerRef};

use crate::config::SandboxConfig;

/// Entities that are drawn.
pub const ACTIVE: GroupId = 1;
/// Entities that exist but are culled.
pub const INACTIVE: GroupId = 2;

/// Per-mesh state the engines read and write.
#[derive(Implementer, Debug, Clone, PartialEq)]
pub struct MeshImplementer {
    pub visible: bool,
}

/// What the culling pass sees of a renderable entity.
#[derive(EntityView, Default, Debug, Clone, Copy)]
pub struct MeshRenderableView {
    pub egid: Egid,
    pub mesh: ImplementerRef<MeshImplementer>,
}

/// Counters the engines bump as frames go by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_opened: u64,
    pub frames_closed: u64,
    pub inputs_consumed: u64,
    /// Meshes drawn in the last frame.
    pub visible_meshes: usize,
    pub gizmos_drawn: u64,
    /// Key of the last input event consumed.
    pub last_key: Option<u32>,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames ({} closed), {} inputs, {} visible meshes, {} gizmos",
            self.frames_opened,
            self.frames_closed,
            self.inputs_consumed,
            self.visible_meshes,
            self.gizmos_drawn
        )?;
        if let Some(key) = self.last_key {
            write!(f, ", last key {key}")?;
        }
        Ok(())
    }
}

/// The context handed to every step.
#[derive(Default)]
pub struct Scene {
    pub db: EntityDatabase,
    pub stats: FrameStats,
}

impl Scene {
    /// Builds the scene described by `config`.
    pub fn populate(config: &SandboxConfig) -> Result<Self> {
        let mut scene = Self::default();
        for (group, count) in [
            (ACTIVE, config.active_meshes),
            (INACTIVE, config.inactive_meshes),
        ] {
            for _ in 0..count {
                scene.spawn_mesh(group)?;
            }
        }
        log::info!("Scene: {}", scene.db.stats());
        Ok(scene)
    }

    /// Reserves one mesh entity in `group`.
    pub fn spawn_mesh(&mut self, group: GroupId) -> Result<Egid> {
        let egid = self.db.reserve_egid(group)?;
        let mesh = self.db.reserve_implementer(MeshImplementer { visible: false });
        self.db.reserve_view::<MeshRenderableView>(egid)?.mesh = mesh;
        Ok(egid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_places_meshes_in_their_groups() {
        let config = SandboxConfig {
            active_meshes: 7,
            inactive_meshes: 3,
            ..SandboxConfig::default()
        };
        let scene = Scene::populate(&config).unwrap();

        assert_eq!(scene.db.view_count::<MeshRenderableView>(ACTIVE), 7);
        assert_eq!(scene.db.view_count::<MeshRenderableView>(INACTIVE), 3);
        assert_eq!(scene.db.entities_reserved(), 10);
        assert_eq!(scene.db.stats().implementers, 10);
    }

    #[test]
    fn test_spawned_view_points_at_its_mesh() {
        let mut scene = Scene::default();
        let egid = scene.spawn_mesh(ACTIVE).unwrap();

        let view = scene.db.query_view::<MeshRenderableView>(egid).unwrap();
        assert_eq!(view.egid(), egid);
        assert!(!scene.db.implementer(view.mesh).unwrap().visible);
        assert_eq!(egid.group_id(), ACTIVE);
    }
}
