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

//! Error type of the sequencer.

use lumen_core::Condition;
use thiserror::Error;

/// A failure while driving the step graph.
///
/// Like the database errors, these indicate wiring bugs in the host. The
/// tick in progress is abandoned; the sequencer itself stays usable.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// `execute_root_sequence` was called before a root node was set.
    #[error("no root node registered")]
    NoRoot,
    /// The sequencer was released; its graph is gone.
    #[error("sequencer has been released")]
    Released,
    /// Dispatch targeted a node that has no edge.
    #[error("node `{node}` has no registered steps")]
    UnknownNode {
        /// Name of the node.
        node: String,
    },
    /// Dispatch re-entered a node that is already being visited.
    #[error("cycle detected: node `{node}` re-entered while it is being visited")]
    Cycle {
        /// Name of the re-entered node.
        node: String,
    },
    /// A step object was invoked while it was already executing.
    #[error("step `{step}` invoked while it is already executing")]
    StepBusy {
        /// Name of the step object.
        step: &'static str,
    },
    /// A step returned an error.
    #[error("step `{step}` failed on condition {condition}")]
    StepFailed {
        /// Name of the step object.
        step: &'static str,
        /// The condition the step was dispatched with.
        condition: Condition,
        /// What the step reported.
        #[source]
        source: anyhow::Error,
    },
}

impl SequencerError {
    /// Follows nested step failures down to the error that started them.
    ///
    /// A step that fans out with a nested dispatch and propagates its error
    /// wraps it once per level; this returns the innermost sequencer error.
    pub fn innermost(&self) -> &SequencerError {
        match self {
            SequencerError::StepFailed { source, .. } => source
                .downcast_ref::<SequencerError>()
                .map_or(self, SequencerError::innermost),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_unwraps_nested_failures() {
        let inner = SequencerError::Cycle {
            node: "Render".to_string(),
        };
        let middle = SequencerError::StepFailed {
            step: "Gizmo",
            condition: 5,
            source: inner.into(),
        };
        let outer = SequencerError::StepFailed {
            step: "Renderer",
            condition: 5,
            source: middle.into(),
        };
        assert!(matches!(outer.innermost(), SequencerError::Cycle { node } if node == "Render"));
    }

    #[test]
    fn test_innermost_stops_at_foreign_errors() {
        let err = SequencerError::StepFailed {
            step: "Loader",
            condition: 1,
            source: anyhow::anyhow!("file missing"),
        };
        assert!(matches!(err.innermost(), SequencerError::StepFailed { step: "Loader", .. }));
    }

    #[test]
    fn test_display() {
        let err = SequencerError::StepFailed {
            step: "Culling",
            condition: 4,
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.to_string(), "step `Culling` failed on condition 4");
        assert_eq!(
            std::error::Error::source(&err).map(|s| s.to_string()),
            Some("boom".to_string())
        );
    }
}
