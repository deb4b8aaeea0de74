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

//! The step graph and the sequencer that walks it once per tick.

use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use lumen_core::Condition;

use crate::step::StepRef;
use crate::SequencerError;

/// An opaque node identity in the step graph.
///
/// Two handles are the same node iff they share the same allocation, so the
/// usual way to get one is [`NodeHandle::of`] on the engine that owns the
/// phase. [`NodeHandle::named`] creates a fresh node not tied to any engine.
#[derive(Clone)]
pub struct NodeHandle {
    identity: Rc<dyn Any>,
    name: Rc<str>,
}

impl NodeHandle {
    /// Uses `engine`'s allocation as the node identity.
    pub fn of<E: 'static>(engine: &Rc<RefCell<E>>) -> Self {
        Self {
            identity: Rc::clone(engine) as Rc<dyn Any>,
            name: Rc::from(type_name::<E>()),
        }
    }

    /// Creates a new node with its own identity.
    pub fn named(name: &str) -> Self {
        Self {
            identity: Rc::new(()),
            name: Rc::from(name),
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.identity) as *const ()
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({} @ {:p})", self.name, self.address())
    }
}

/// What runs when a node is visited.
///
/// The branch list registered for the visit's condition runs first, then the
/// unconditional list. A condition without a branch is not an error.
pub struct StepEdge<C> {
    unconditional: Vec<StepRef<C>>,
    branches: BTreeMap<Condition, Vec<StepRef<C>>>,
}

impl<C> StepEdge<C> {
    /// Creates an edge with no steps.
    pub fn new() -> Self {
        Self {
            unconditional: Vec::new(),
            branches: BTreeMap::new(),
        }
    }

    /// Appends a step to the unconditional list.
    pub fn always(mut self, step: &StepRef<C>) -> Self {
        self.unconditional.push(Rc::clone(step));
        self
    }

    /// Appends a step to the branch list of `condition`.
    pub fn on(mut self, condition: impl Into<Condition>, step: &StepRef<C>) -> Self {
        self.branches
            .entry(condition.into())
            .or_default()
            .push(Rc::clone(step));
        self
    }

    /// Number of steps in the unconditional list.
    pub fn unconditional_len(&self) -> usize {
        self.unconditional.len()
    }

    /// Number of steps in the branch list of `condition`.
    pub fn branch_len(&self, condition: impl Into<Condition>) -> usize {
        self.branches.get(&condition.into()).map_or(0, Vec::len)
    }
}

impl<C> Default for StepEdge<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole graph: every node and its edge.
pub type Steps<C> = HashMap<NodeHandle, StepEdge<C>>;

/// Where the sequencer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// No tick has run yet.
    NotStarted,
    /// Running the root sequence entry at `phase_index`.
    Running {
        /// Index into the root sequence.
        phase_index: usize,
    },
    /// Between ticks.
    Idle,
    /// The graph was torn down. Terminal.
    Released,
}

/// The frame scheduler.
///
/// Owns the step graph and a root sequence of conditions. Each call to
/// [`execute_root_sequence`](Self::execute_root_sequence) visits the root
/// node once per condition, in order. Steps may fan out into other nodes
/// through [`Dispatch::next`].
///
/// `C` is the context handed to every step: typically the host's bundle of
/// shared services, such as the entity database.
pub struct Sequencer<C> {
    root: Option<NodeHandle>,
    steps: Steps<C>,
    root_sequence: Vec<Condition>,
    visiting: RefCell<Vec<NodeHandle>>,
    state: Cell<SequencerState>,
    ticks: Cell<u64>,
}

impl<C: 'static> Sequencer<C> {
    /// Creates a sequencer with an empty graph.
    pub fn new() -> Self {
        Self {
            root: None,
            steps: HashMap::new(),
            root_sequence: Vec::new(),
            visiting: RefCell::new(Vec::new()),
            state: Cell::new(SequencerState::NotStarted),
            ticks: Cell::new(0),
        }
    }

    /// Registers the whole graph at once, replacing any previous one.
    pub fn set_steps(&mut self, steps: Steps<C>) {
        log::info!("Sequencer: registered {} nodes", steps.len());
        self.steps = steps;
    }

    /// Sets the node the root sequence dispatches into.
    pub fn set_root(&mut self, root: NodeHandle) {
        log::info!("Sequencer: root node is {}", root.name());
        self.root = Some(root);
    }

    /// Sets the ordered list of conditions every tick walks.
    pub fn set_root_sequence<I>(&mut self, conditions: I)
    where
        I: IntoIterator,
        I::Item: Into<Condition>,
    {
        self.root_sequence = conditions.into_iter().map(Into::into).collect();
        log::info!("Sequencer: root sequence {:?}", self.root_sequence);
    }

    /// Runs one tick: visits the root node once per root-sequence condition,
    /// with the unit token `()`.
    ///
    /// The first error aborts the tick and is returned.
    pub fn execute_root_sequence(&self, context: &mut C) -> Result<(), SequencerError> {
        if self.state.get() == SequencerState::Released {
            return Err(SequencerError::Released);
        }
        let root = self.root.as_ref().ok_or(SequencerError::NoRoot)?;

        for (phase_index, condition) in self.root_sequence.iter().enumerate() {
            self.state.set(SequencerState::Running { phase_index });
            if let Err(err) = self.next(context, root, &(), *condition) {
                self.state.set(SequencerState::Idle);
                log::error!("Sequencer: tick {} aborted: {}", self.ticks.get(), err);
                return Err(err);
            }
        }

        self.state.set(SequencerState::Idle);
        self.ticks.set(self.ticks.get() + 1);
        Ok(())
    }

    /// Visits `node` with `token` under `condition`.
    ///
    /// Runs the node's branch list for `condition` (if any), then its
    /// unconditional list. Every step fires each of its declared capabilities
    /// that matches `token`.
    pub fn next<T: 'static>(
        &self,
        context: &mut C,
        node: &NodeHandle,
        token: &T,
        condition: impl Into<Condition>,
    ) -> Result<(), SequencerError> {
        let condition = condition.into();
        if self.state.get() == SequencerState::Released {
            return Err(SequencerError::Released);
        }
        let edge = self
            .steps
            .get(node)
            .ok_or_else(|| SequencerError::UnknownNode {
                node: node.name().to_string(),
            })?;

        if self.visiting.borrow().contains(node) {
            return Err(SequencerError::Cycle {
                node: node.name().to_string(),
            });
        }

        self.visiting.borrow_mut().push(node.clone());
        let result = self.visit(context, edge, token, condition);
        self.visiting.borrow_mut().pop();
        result
    }

    fn visit<T: 'static>(
        &self,
        context: &mut C,
        edge: &StepEdge<C>,
        token: &T,
        condition: Condition,
    ) -> Result<(), SequencerError> {
        let mut dispatch = Dispatch {
            sequencer: self,
            context,
            condition,
        };
        if let Some(branch) = edge.branches.get(&condition) {
            for step in branch {
                step.invoke(&mut dispatch, token, condition)?;
            }
        }
        for step in &edge.unconditional {
            step.invoke(&mut dispatch, token, condition)?;
        }
        Ok(())
    }

    /// Tears down the root and the whole graph. The sequencer cannot run again.
    pub fn release(&mut self) {
        log::info!(
            "Sequencer: releasing {} nodes after {} ticks",
            self.steps.len(),
            self.ticks.get()
        );
        self.root = None;
        self.steps.clear();
        self.state.set(SequencerState::Released);
    }

    /// Returns `true` once [`release`](Self::release) was called.
    pub fn is_released(&self) -> bool {
        self.state.get() == SequencerState::Released
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SequencerState {
        self.state.get()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.steps.len()
    }

    /// The ordered root sequence.
    pub fn root_sequence(&self) -> &[Condition] {
        &self.root_sequence
    }
}

impl<C: 'static> Default for Sequencer<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a step sees while it runs: the host context and a way to fan out.
pub struct Dispatch<'a, C> {
    sequencer: &'a Sequencer<C>,
    context: &'a mut C,
    condition: Condition,
}

impl<'a, C: 'static> Dispatch<'a, C> {
    /// The host context.
    pub fn context(&mut self) -> &mut C {
        &mut *self.context
    }

    /// The condition of the visit in progress.
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// The sequencer driving this dispatch.
    pub fn sequencer(&self) -> &Sequencer<C> {
        self.sequencer
    }

    /// Visits another node from inside a step. See [`Sequencer::next`].
    pub fn next<T: 'static>(
        &mut self,
        node: &NodeHandle,
        token: &T,
        condition: impl Into<Condition>,
    ) -> Result<(), SequencerError> {
        self.sequencer.next(&mut *self.context, node, token, condition)
    }
}
