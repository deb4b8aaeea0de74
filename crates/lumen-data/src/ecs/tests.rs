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

use lumen_core::{EntityView, Egid, Implementer, INVALID_GROUP};

use super::{DatabaseError, EntityDatabase, ImplementerRef};

// --- SHAPES FOR TESTING ---

const ACTIVE: u32 = 1;
const INACTIVE: u32 = 2;

#[derive(Implementer, Debug, Clone, PartialEq)]
struct Transform {
    position: [f32; 3],
    scale: f32,
}

#[derive(Implementer, Debug, Clone, PartialEq)]
struct MeshImplementer {
    transform: Transform,
    bounds_radius: f32,
    visible: bool,
    mesh_id: u32,
}

#[derive(Implementer, Debug, Clone, Copy, PartialEq)]
struct PointLight {
    color: [u8; 4],
}

#[derive(EntityView, Default, Debug)]
struct MeshRenderableView {
    egid: Egid,
    mesh: ImplementerRef<MeshImplementer>,
}

#[derive(EntityView, Default, Debug)]
struct LightView {
    egid: Egid,
    light: ImplementerRef<PointLight>,
}

fn mesh(id: u32) -> MeshImplementer {
    MeshImplementer {
        transform: Transform {
            position: [id as f32, 0.0, 0.0],
            scale: 1.0,
        },
        bounds_radius: 0.5,
        visible: false,
        mesh_id: id,
    }
}

// --- TESTS ---

#[test]
fn test_entity_ids_strictly_increase() {
    let mut db = EntityDatabase::new();
    let ids: Vec<u32> = (0..1000).map(|_| db.reserve_entity_id().unwrap()).collect();

    assert_eq!(ids[0], 1, "The first id should be 1; 0 is reserved");
    assert!(
        ids.windows(2).all(|w| w[0] < w[1]),
        "Ids must be strictly increasing"
    );
    assert_eq!(db.entities_reserved(), 1000);
}

#[test]
fn test_entity_ids_not_reused_after_clear() {
    let mut db = EntityDatabase::new();
    let before = db.reserve_entity_id().unwrap();
    db.clear();
    let after = db.reserve_entity_id().unwrap();
    assert!(after > before);
}

#[test]
fn test_entity_id_exhaustion_is_reported() {
    let mut db = EntityDatabase::with_last_entity_id(u32::MAX - 1);
    assert_eq!(db.reserve_entity_id().unwrap(), u32::MAX);
    assert_eq!(
        db.reserve_entity_id().unwrap_err(),
        DatabaseError::EntityIdsExhausted { reserved: u32::MAX }
    );
}

#[test]
fn test_reserve_egid_packs_group() {
    let mut db = EntityDatabase::new();
    let egid = db.reserve_egid(ACTIVE).unwrap();
    assert_eq!(egid.group_id(), ACTIVE);
    assert_eq!(egid.entity_id(), 1);
    assert!(matches!(
        db.reserve_egid(INVALID_GROUP),
        Err(DatabaseError::InvalidEgidGroup)
    ));
}

#[test]
fn test_implementer_pointer_stability() {
    // --- 1. SETUP ---
    let mut db = EntityDatabase::new();
    let first = db.reserve_implementer(mesh(0));
    let first_addr = db.implementer(first).unwrap() as *const MeshImplementer;
    let first_copy = db.implementer(first).unwrap().clone();

    // --- 2. ACTION ---
    // Enough reservations of the same type to allocate several more buckets,
    // interleaved with reservations of another type.
    let per_bucket = db.implementers_of::<MeshImplementer>().unwrap().elements_per_bucket();
    let mut handles = vec![first];
    for i in 1..(per_bucket * 4) as u32 {
        handles.push(db.reserve_implementer(mesh(i)));
        db.reserve_implementer(PointLight { color: [i as u8; 4] });
    }

    // --- 3. ASSERTIONS ---
    let buckets = db.implementers_of::<MeshImplementer>().unwrap();
    assert_eq!(buckets.bucket_count(), 4);
    assert_eq!(
        db.implementer(first).unwrap() as *const MeshImplementer,
        first_addr,
        "The first implementer must not move"
    );
    assert_eq!(db.implementer(first).unwrap(), &first_copy);

    let mut addresses: Vec<*const MeshImplementer> = handles
        .iter()
        .map(|h| db.implementer(*h).unwrap() as *const MeshImplementer)
        .collect();
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(db.implementer(*handle).unwrap().mesh_id, i as u32);
    }
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), handles.len(), "Every handle is distinct");
}

#[test]
fn test_reserve_view_then_query_returns_same_egid() {
    let mut db = EntityDatabase::new();
    let egid = db.reserve_egid(ACTIVE).unwrap();
    db.reserve_view::<MeshRenderableView>(egid).unwrap();

    let view = db.query_view::<MeshRenderableView>(egid).unwrap();
    assert_eq!(view.egid(), egid);
    assert!(db.has_view::<MeshRenderableView>(egid));
}

#[test]
fn test_group_query_count_matches_reservations() {
    let mut db = EntityDatabase::new();
    for _ in 0..7 {
        let egid = db.reserve_egid(ACTIVE).unwrap();
        db.reserve_view::<MeshRenderableView>(egid).unwrap();
    }
    for _ in 0..3 {
        let egid = db.reserve_egid(INACTIVE).unwrap();
        db.reserve_view::<MeshRenderableView>(egid).unwrap();
    }

    assert_eq!(db.query_views::<MeshRenderableView>(ACTIVE).unwrap().len(), 7);
    assert_eq!(db.query_views::<MeshRenderableView>(INACTIVE).unwrap().len(), 3);
    assert_eq!(db.view_count::<MeshRenderableView>(ACTIVE), 7);
    assert_eq!(db.view_count::<LightView>(ACTIVE), 0);
    assert_eq!(db.groups_of::<MeshRenderableView>(), vec![ACTIVE, INACTIVE]);
}

#[test]
fn test_invalid_group_query_fails() {
    let mut db = EntityDatabase::new();
    let egid = db.reserve_egid(ACTIVE).unwrap();
    db.reserve_view::<MeshRenderableView>(egid).unwrap();

    let result = db.query_views::<MeshRenderableView>(INVALID_GROUP);
    assert!(
        matches!(result, Err(DatabaseError::InvalidGroup { .. })),
        "Querying group 0 must fail, not return an empty slice"
    );
}

#[test]
fn test_unreserved_view_type_fails() {
    let db = EntityDatabase::new();
    assert!(matches!(
        db.query_views::<LightView>(ACTIVE),
        Err(DatabaseError::UnknownViewType { .. })
    ));
    assert!(matches!(
        db.query_view::<LightView>(Egid::new(1, ACTIVE)),
        Err(DatabaseError::UnknownViewType { .. })
    ));
}

#[test]
fn test_views_project_onto_implementers() {
    // --- 1. SETUP ---
    let mut db = EntityDatabase::new();
    let mut egids = Vec::new();
    for i in 0..10 {
        let group = if i % 2 == 0 { ACTIVE } else { INACTIVE };
        let egid = db.reserve_egid(group).unwrap();
        let handle = db.reserve_implementer(mesh(i));
        db.reserve_view::<MeshRenderableView>(egid).unwrap().mesh = handle;
        egids.push(egid);
    }

    // --- 2. ACTION ---
    // A culling-style pass: flag every ACTIVE mesh visible.
    let (implementers, views) = db.split_mut();
    for view in views.query::<MeshRenderableView>(ACTIVE).unwrap() {
        implementers.get_mut(view.mesh).unwrap().visible = true;
    }

    // --- 3. ASSERTIONS ---
    for egid in egids {
        let view = db.query_view::<MeshRenderableView>(egid).unwrap();
        let mesh = db.implementer(view.mesh).unwrap();
        assert_eq!(mesh.visible, egid.group_id() == ACTIVE);
    }
}

#[test]
fn test_implementer_handle_is_dangling_after_clear() {
    // --- 1. SETUP ---
    let mut db = EntityDatabase::new();
    let old = db.reserve_implementer(PointLight { color: [1; 4] });

    // --- 2. ACTION ---
    db.clear();
    let new = db.reserve_implementer(PointLight { color: [9; 4] });

    // --- 3. ASSERTIONS ---
    // Both handles sit at the first slot of the first bucket.
    assert_eq!((old.bucket(), old.slot()), (new.bucket(), new.slot()));
    assert!(matches!(
        db.implementer(old),
        Err(DatabaseError::DanglingImplementer { .. })
    ));
    assert!(matches!(
        db.implementer_mut(old),
        Err(DatabaseError::DanglingImplementer { .. })
    ));
    assert_eq!(db.implementer(new).unwrap().color, [9; 4]);
}

#[test]
fn test_implementer_handle_does_not_resolve_in_another_database() {
    let mut first = EntityDatabase::new();
    let mut second = EntityDatabase::new();
    let light = first.reserve_implementer(PointLight { color: [1; 4] });
    second.reserve_implementer(PointLight { color: [2; 4] });

    assert!(matches!(
        second.implementer(light),
        Err(DatabaseError::DanglingImplementer { .. })
    ));
    assert_eq!(first.implementer(light).unwrap().color, [1; 4]);
}

#[test]
fn test_same_implementer_shared_by_two_views() {
    let mut db = EntityDatabase::new();
    let egid = db.reserve_egid(ACTIVE).unwrap();
    let light = db.reserve_implementer(PointLight { color: [1, 2, 3, 4] });
    db.reserve_view::<LightView>(egid).unwrap().light = light;
    db.reserve_view::<LightView>(egid.with_group(INACTIVE))
        .unwrap()
        .light = light;

    db.implementer_mut(light).unwrap().color = [9; 4];

    for group in [ACTIVE, INACTIVE] {
        let view = db.query_view::<LightView>(egid.with_group(group)).unwrap();
        assert_eq!(db.implementer(view.light).unwrap().color, [9; 4]);
    }
}

#[test]
fn test_view_written_after_reservation_survives_growth() {
    let mut db = EntityDatabase::new();
    let first = db.reserve_egid(ACTIVE).unwrap();
    let light = db.reserve_implementer(PointLight { color: [7; 4] });
    db.reserve_view::<LightView>(first).unwrap().light = light;

    for _ in 0..10_000 {
        let egid = db.reserve_egid(ACTIVE).unwrap();
        db.reserve_view::<LightView>(egid).unwrap();
    }

    let view = db.query_view::<LightView>(first).unwrap();
    assert_eq!(view.light, light);
    assert_eq!(db.query_views::<LightView>(ACTIVE).unwrap()[0].egid(), first);
}

#[test]
fn test_stats_and_clear() {
    let mut db = EntityDatabase::new();
    let egid = db.reserve_egid(ACTIVE).unwrap();
    db.reserve_implementer(mesh(1));
    db.reserve_implementer(PointLight { color: [0; 4] });
    db.reserve_view::<MeshRenderableView>(egid).unwrap();
    db.reserve_view::<LightView>(egid).unwrap();

    let stats = db.stats();
    assert_eq!(stats.entities, 1);
    assert_eq!(stats.implementer_kinds, 2);
    assert_eq!(stats.implementers, 2);
    assert_eq!(stats.implementer_buckets, 2);
    assert_eq!(stats.view_kinds, 2);
    assert_eq!(stats.view_keys, 2);
    assert_eq!(stats.views, 2);

    db.clear();
    let stats = db.stats();
    assert_eq!(stats.entities, 1, "The id counter survives teardown");
    assert_eq!(stats.implementers, 0);
    assert_eq!(stats.views, 0);
    assert!(!db.has_view::<LightView>(egid));
}
