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

//! The frame-phase protocol every engine is wired against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer tag identifying which stage of the frame loop is executing.
///
/// Conditions select the branch list of a step edge. Hosts may use any value;
/// the [`Phase`] enumeration gives the values the testbed agrees on.
pub type Condition = i32;

/// The per-tick phases of the testbed's frame loop.
///
/// The discriminants are the conditions the root sequence walks, so an engine
/// registered on `Phase::Render` receives `Phase::Render as Condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Phase {
    /// Start of a frame, before anything else runs.
    OpenFrame = 1,
    /// Input devices are polled and input tokens are fanned out.
    InputUpdate = 2,
    /// Gameplay and simulation logic.
    LogicUpdate = 3,
    /// Culling, batching and other render preparation.
    PreRender = 4,
    /// Draw submission.
    Render = 5,
    /// Post-processing and debug overlays.
    PostRender = 6,
    /// End of a frame.
    CloseFrame = 7,
}

impl Phase {
    /// The root sequence of a regular frame, in execution order.
    pub const DEFAULT_SEQUENCE: [Phase; 7] = [
        Phase::OpenFrame,
        Phase::InputUpdate,
        Phase::LogicUpdate,
        Phase::PreRender,
        Phase::Render,
        Phase::PostRender,
        Phase::CloseFrame,
    ];

    /// Returns the condition value of this phase.
    #[inline]
    #[must_use]
    pub const fn condition(self) -> Condition {
        self as Condition
    }

    /// Maps a condition back to a phase, if it is one of the protocol values.
    #[must_use]
    pub fn from_condition(condition: Condition) -> Option<Self> {
        Self::DEFAULT_SEQUENCE
            .into_iter()
            .find(|phase| phase.condition() == condition)
    }
}

impl From<Phase> for Condition {
    fn from(phase: Phase) -> Self {
        phase.condition()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::OpenFrame => write!(f, "OpenFrame"),
            Phase::InputUpdate => write!(f, "InputUpdate"),
            Phase::LogicUpdate => write!(f, "LogicUpdate"),
            Phase::PreRender => write!(f, "PreRender"),
            Phase::Render => write!(f, "Render"),
            Phase::PostRender => write!(f, "PostRender"),
            Phase::CloseFrame => write!(f, "CloseFrame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_are_distinct_and_nonzero() {
        let mut seen = Vec::new();
        for phase in Phase::DEFAULT_SEQUENCE {
            let condition = Condition::from(phase);
            assert_ne!(condition, 0);
            assert!(!seen.contains(&condition));
            seen.push(condition);
        }
    }

    #[test]
    fn test_from_condition() {
        assert_eq!(Phase::from_condition(5), Some(Phase::Render));
        assert_eq!(Phase::from_condition(0), None);
        assert_eq!(Phase::from_condition(99), None);
    }

    #[test]
    fn test_sequence_is_in_frame_order() {
        let conditions: Vec<Condition> = Phase::DEFAULT_SEQUENCE
            .iter()
            .map(|p| p.condition())
            .collect();
        let mut sorted = conditions.clone();
        sorted.sort_unstable();
        assert_eq!(conditions, sorted);
    }

    #[test]
    fn test_phase_names_in_config() {
        let parsed: Vec<Phase> = ron::from_str("[OpenFrame, Render, CloseFrame]").unwrap();
        assert_eq!(parsed, vec![Phase::OpenFrame, Phase::Render, Phase::CloseFrame]);
    }
}
