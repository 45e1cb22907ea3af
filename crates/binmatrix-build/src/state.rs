//! Per-triple build state machine.
//!
//! ```text
//! Pending ──start──▶ Building ──packaged──▶ Packaged
//!                       │
//!                       └──fail──▶ Failed
//! ```
//!
//! No other transition is legal. A batch halts on the first `Failed`.

use std::time::Duration;

use binmatrix_package::Artifact;
use binmatrix_targets::{platform_name, PlatformName, TargetTriple};
use serde::Serialize;

use crate::error::{BuildError, Result};

/// Lifecycle state of one triple's build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Pending,
    Building,
    Packaged,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Packaged | BuildState::Failed)
    }

    fn can_transition_to(self, next: BuildState) -> bool {
        matches!(
            (self, next),
            (BuildState::Pending, BuildState::Building)
                | (BuildState::Building, BuildState::Packaged)
                | (BuildState::Building, BuildState::Failed)
        )
    }
}

/// Tracks one triple through the state machine.
#[derive(Debug, Clone)]
pub struct TargetBuild {
    pub triple: TargetTriple,
    pub platform: PlatformName,
    state: BuildState,
    /// Packaged outputs, filled on the `Packaged` transition.
    pub artifacts: Vec<Artifact>,
    /// Failure description, filled on the `Failed` transition.
    pub failure: Option<String>,
    pub duration: Duration,
}

impl TargetBuild {
    pub fn new(triple: TargetTriple) -> Self {
        TargetBuild {
            triple,
            platform: platform_name(triple),
            state: BuildState::Pending,
            artifacts: Vec::new(),
            failure: None,
            duration: Duration::ZERO,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    fn transition(&mut self, next: BuildState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BuildError::InvalidTransition {
                triple: self.triple.to_string(),
                from: self.state,
                to: next,
            });
        }
        log::debug!("{}: {:?} -> {:?}", self.triple, self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(BuildState::Building)
    }

    pub fn packaged(&mut self, artifacts: Vec<Artifact>) -> Result<()> {
        self.transition(BuildState::Packaged)?;
        self.artifacts = artifacts;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(BuildState::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }
}
