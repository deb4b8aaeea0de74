use criterion::{criterion_group, criterion_main, Criterion};
use lumen_core::{EntityView, Egid, Implementer};
use lumen_data::{EntityDatabase, ImplementerRef};
use std::hint::black_box;

const ACTIVE: u32 = 1;
const INACTIVE: u32 = 2;

#[derive(Implementer)]
struct MeshImplementer {
    position: [f32; 3],
    radius: f32,
    visible: bool,
}

#[derive(EntityView, Default)]
struct MeshView {
    egid: Egid,
    mesh: ImplementerRef<MeshImplementer>,
}

fn bench_view_queries(c: &mut Criterion) {
    let mut db = EntityDatabase::new();

    // Setup 10,000 entities, half of them active.
    for i in 0..10_000u32 {
        let group = if i % 2 == 0 { ACTIVE } else { INACTIVE };
        let egid = db.reserve_egid(group).unwrap();
        let mesh = db.reserve_implementer(MeshImplementer {
            position: [i as f32, 0.0, 0.0],
            radius: 1.0,
            visible: false,
        });
        db.reserve_view::<MeshView>(egid).unwrap().mesh = mesh;
    }

    let mut group = c.benchmark_group("View Queries");

    group.bench_function("Group slice (ACTIVE)", |b| {
        b.iter(|| {
            let views = db.query_views::<MeshView>(ACTIVE).unwrap();
            black_box(views.len());
        });
    });

    group.bench_function("Cull through views (ACTIVE)", |b| {
        b.iter(|| {
            let (implementers, views) = db.split_mut();
            for view in views.query::<MeshView>(ACTIVE).unwrap() {
                let mesh = implementers.get_mut(view.mesh).unwrap();
                mesh.visible = mesh.position[0] + mesh.radius > 100.0;
            }
        });
    });

    group.bench_function("Random access by Egid", |b| {
        b.iter(|| {
            let view = db.query_view::<MeshView>(Egid::new(5_001, ACTIVE)).unwrap();
            black_box(view.mesh);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_view_queries);
criterion_main!(benches);
