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

//! Capability-step interfaces and the descriptors built from them.
//!
//! An engine takes part in the frame by implementing any subset of three
//! capabilities:
//!
//! 1. [`UnconditionalStep`] runs whenever the engine's placement is visited,
//!    whatever the token and condition.
//! 2. [`TokenStep<T, C>`] runs when the engine is visited with a `T` token.
//!    One engine can implement it for several token types.
//! 3. [`ConditionalStep<T, C>`] is like `TokenStep` but also receives the
//!    phase condition, so one engine can branch on the phase.
//!
//! Capabilities are declared once, at registration, with a [`StepBuilder`].
//! Dispatch never probes an engine for the traits it implements; it looks up
//! the handlers recorded in the engine's [`StepObject`].
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use lumen_control::{Dispatch, StepObject, StepResult, TokenStep, UnconditionalStep};
//!
//! struct Counter(u32);
//! struct Frame;
//!
//! impl UnconditionalStep<()> for Counter {
//!     fn step(&mut self, _: &mut Dispatch<'_, ()>) -> StepResult {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! impl TokenStep<Frame, ()> for Counter {
//!     fn step_with(&mut self, _: &mut Dispatch<'_, ()>, _: &Frame) -> StepResult {
//!         self.0 += 10;
//!         Ok(())
//!     }
//! }
//!
//! let counter = Rc::new(RefCell::new(Counter(0)));
//! let step = StepObject::<()>::builder(&counter)
//!     .unconditional()
//!     .token::<Frame>()
//!     .build();
//! assert!(step.has_unconditional());
//! assert!(step.handles_token::<Frame>());
//! ```

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use lumen_core::Condition;

use crate::sequencer::Dispatch;
use crate::SequencerError;

/// What a step body returns. Any error aborts the tick in progress.
pub type StepResult = anyhow::Result<()>;

/// A step that runs every time its placement is visited.
pub trait UnconditionalStep<C> {
    /// Runs the step.
    fn step(&mut self, dispatch: &mut Dispatch<'_, C>) -> StepResult;
}

/// A step that runs when visited with a token of type `T`.
pub trait TokenStep<T, C> {
    /// Runs the step with the dispatched token.
    fn step_with(&mut self, dispatch: &mut Dispatch<'_, C>, token: &T) -> StepResult;
}

/// A step that runs when visited with a token of type `T` and also sees the
/// phase condition.
pub trait ConditionalStep<T, C> {
    /// Runs the step with the dispatched token and condition.
    fn step_when(
        &mut self,
        dispatch: &mut Dispatch<'_, C>,
        token: &T,
        condition: Condition,
    ) -> StepResult;
}

/// Why a handler did not complete.
enum Failure {
    /// The engine is already borrowed by a step further up the stack.
    Busy,
    /// The step body returned an error.
    Failed(anyhow::Error),
}

type Handler<C> = Box<dyn Fn(&mut Dispatch<'_, C>, &dyn Any, Condition) -> Result<(), Failure>>;

fn handler<C, F>(f: F) -> Handler<C>
where
    F: Fn(&mut Dispatch<'_, C>, &dyn Any, Condition) -> Result<(), Failure> + 'static,
{
    Box::new(f)
}

/// A shared step descriptor. The same step may sit in several edges.
pub type StepRef<C> = Rc<StepObject<C>>;

/// The capability descriptor of one engine.
///
/// Holds at most one handler per capability (per token type for the typed
/// ones). Built with [`StepObject::builder`].
pub struct StepObject<C> {
    name: &'static str,
    unconditional: Option<Handler<C>>,
    tokens: HashMap<TypeId, Handler<C>>,
    conditionals: HashMap<TypeId, Handler<C>>,
}

impl<C: 'static> StepObject<C> {
    /// Starts describing the capabilities of `engine`.
    pub fn builder<E: 'static>(engine: &Rc<RefCell<E>>) -> StepBuilder<E, C> {
        StepBuilder {
            engine: Rc::clone(engine),
            object: StepObject {
                name: type_name::<E>(),
                unconditional: None,
                tokens: HashMap::new(),
                conditionals: HashMap::new(),
            },
        }
    }

    /// Name used in logs and errors. Defaults to the engine's type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the engine declared [`UnconditionalStep`].
    pub fn has_unconditional(&self) -> bool {
        self.unconditional.is_some()
    }

    /// Returns `true` if the engine declared [`TokenStep<T, C>`].
    pub fn handles_token<T: 'static>(&self) -> bool {
        self.tokens.contains_key(&TypeId::of::<T>())
    }

    /// Returns `true` if the engine declared [`ConditionalStep<T, C>`].
    pub fn handles_conditional<T: 'static>(&self) -> bool {
        self.conditionals.contains_key(&TypeId::of::<T>())
    }

    /// Fires every declared capability that matches `token`.
    ///
    /// Order: unconditional, then token, then conditional.
    pub(crate) fn invoke<T: 'static>(
        &self,
        dispatch: &mut Dispatch<'_, C>,
        token: &T,
        condition: Condition,
    ) -> Result<(), SequencerError> {
        log::trace!("Sequencer: step {} on condition {}", self.name, condition);
        let id = TypeId::of::<T>();
        let token: &dyn Any = token;
        let handlers = self
            .unconditional
            .iter()
            .chain(self.tokens.get(&id))
            .chain(self.conditionals.get(&id));
        for run in handlers {
            run(dispatch, token, condition).map_err(|failure| match failure {
                Failure::Busy => SequencerError::StepBusy { step: self.name },
                Failure::Failed(source) => SequencerError::StepFailed {
                    step: self.name,
                    condition,
                    source,
                },
            })?;
        }
        Ok(())
    }
}

impl<C> fmt::Debug for StepObject<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepObject")
            .field("name", &self.name)
            .field("unconditional", &self.unconditional.is_some())
            .field("tokens", &self.tokens.len())
            .field("conditionals", &self.conditionals.len())
            .finish()
    }
}

/// Records the capabilities of one engine into a [`StepObject`].
///
/// Each method is only callable when the engine implements the matching trait,
/// so a descriptor can never promise a capability the engine lacks.
pub struct StepBuilder<E, C> {
    engine: Rc<RefCell<E>>,
    object: StepObject<C>,
}

impl<E: 'static, C: 'static> StepBuilder<E, C> {
    /// Overrides the name used in logs and errors.
    pub fn named(mut self, name: &'static str) -> Self {
        self.object.name = name;
        self
    }

    /// Declares [`UnconditionalStep`].
    pub fn unconditional(mut self) -> Self
    where
        E: UnconditionalStep<C>,
    {
        let engine = Rc::clone(&self.engine);
        self.object.unconditional = Some(handler(move |dispatch, _token, _condition| {
            let mut engine = engine.try_borrow_mut().map_err(|_| Failure::Busy)?;
            engine.step(dispatch).map_err(Failure::Failed)
        }));
        self
    }

    /// Declares [`TokenStep<T, C>`].
    pub fn token<T: 'static>(mut self) -> Self
    where
        E: TokenStep<T, C>,
    {
        let engine = Rc::clone(&self.engine);
        self.object.tokens.insert(
            TypeId::of::<T>(),
            handler(move |dispatch, token, _condition| {
                // Handlers are keyed by `TypeId::of::<T>()`, so this always matches.
                let Some(token) = token.downcast_ref::<T>() else {
                    return Ok(());
                };
                let mut engine = engine.try_borrow_mut().map_err(|_| Failure::Busy)?;
                engine.step_with(dispatch, token).map_err(Failure::Failed)
            }),
        );
        self
    }

    /// Declares [`ConditionalStep<T, C>`].
    pub fn conditional<T: 'static>(mut self) -> Self
    where
        E: ConditionalStep<T, C>,
    {
        let engine = Rc::clone(&self.engine);
        self.object.conditionals.insert(
            TypeId::of::<T>(),
            handler(move |dispatch, token, condition| {
                let Some(token) = token.downcast_ref::<T>() else {
                    return Ok(());
                };
                let mut engine = engine.try_borrow_mut().map_err(|_| Failure::Busy)?;
                engine
                    .step_when(dispatch, token, condition)
                    .map_err(Failure::Failed)
            }),
        );
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> StepRef<C> {
        if self.object.unconditional.is_none()
            && self.object.tokens.is_empty()
            && self.object.conditionals.is_empty()
        {
            log::warn!(
                "StepObject {} declares no capability and will never run",
                self.object.name
            );
        }
        Rc::new(self.object)
    }
}
