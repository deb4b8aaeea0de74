use std::cell::RefCell;
use std::collections::HashMap;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};
use lumen_control::{
    Dispatch, NodeHandle, Sequencer, StepEdge, StepObject, StepResult, TokenStep,
    UnconditionalStep,
};
use lumen_core::Phase;

#[derive(Default)]
struct Counter(u64);

impl UnconditionalStep<u64> for Counter {
    fn step(&mut self, dispatch: &mut Dispatch<'_, u64>) -> StepResult {
        self.0 += 1;
        *dispatch.context() += 1;
        Ok(())
    }
}

struct Gizmo;

impl TokenStep<Gizmo, u64> for Counter {
    fn step_with(&mut self, _: &mut Dispatch<'_, u64>, _: &Gizmo) -> StepResult {
        self.0 += 2;
        Ok(())
    }
}

struct Fan {
    target: NodeHandle,
}

impl UnconditionalStep<u64> for Fan {
    fn step(&mut self, dispatch: &mut Dispatch<'_, u64>) -> StepResult {
        let condition = dispatch.condition();
        dispatch.next(&self.target, &Gizmo, condition)?;
        Ok(())
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let root = NodeHandle::named("Root");
    let gizmos = NodeHandle::named("Gizmos");

    let mut root_edge = StepEdge::new();
    let mut gizmo_edge = StepEdge::new();
    for _ in 0..32 {
        let engine = Rc::new(RefCell::new(Counter::default()));
        let step = StepObject::<u64>::builder(&engine)
            .unconditional()
            .token::<Gizmo>()
            .build();
        root_edge = root_edge.on(Phase::LogicUpdate, &step);
        gizmo_edge = gizmo_edge.always(&step);
    }
    let fan = Rc::new(RefCell::new(Fan {
        target: gizmos.clone(),
    }));
    let fan_step = StepObject::<u64>::builder(&fan).unconditional().build();
    root_edge = root_edge.on(Phase::Render, &fan_step);

    let mut steps = HashMap::new();
    steps.insert(root.clone(), root_edge);
    steps.insert(gizmos, gizmo_edge);

    let mut sequencer = Sequencer::new();
    sequencer.set_steps(steps);
    sequencer.set_root(root);
    sequencer.set_root_sequence(Phase::DEFAULT_SEQUENCE);

    let mut group = c.benchmark_group("Sequencer");
    let mut context = 0u64;

    group.bench_function("Root sequence (32 engines, 1 fan-out)", |b| {
        b.iter(|| {
            sequencer.execute_root_sequence(&mut context).unwrap();
            black_box(context);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
