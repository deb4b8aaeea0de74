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

//! # Lumen Control
//!
//! The frame scheduler of the testbed. A [`Sequencer`] walks a fixed list of
//! phase conditions once per tick and, for every phase, dispatches into a
//! graph of step edges. Engines take part by implementing any subset of the
//! capability traits in [`step`] and being registered on a node.

#![warn(missing_docs)]

pub mod error;
pub mod sequencer;
pub mod step;

pub use error::SequencerError;
pub use sequencer::{Dispatch, NodeHandle, Sequencer, SequencerState, StepEdge, Steps};
pub use step::{
    ConditionalStep, StepBuilder, StepObject, StepRef, StepResult, TokenStep, UnconditionalStep,
};
