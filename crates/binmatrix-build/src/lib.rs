//! Build orchestration across the binmatrix target matrix.
//!
//! ## Modules
//!
//! - [`toolchain`]: Invocation model and the runner seam (real processes or scripted)
//! - [`state`]: Per-triple `Pending → Building → Packaged | Failed` state machine
//! - [`header`]: Binding-header generator, run once for the primary triple
//! - [`orchestrator`]: Planning and sequential fail-fast execution
//! - [`report`]: Batch report and its human-readable rendering

pub mod error;
pub mod header;
pub mod orchestrator;
pub mod report;
pub mod state;
pub mod toolchain;

pub use error::{BuildError, Result};
pub use header::HeaderEmitter;
pub use orchestrator::{BuildPlan, Orchestrator, PlannedStep, ProjectLayout, Selection, SkippedTarget};
pub use report::BuildReport;
pub use state::{BuildState, TargetBuild};
pub use toolchain::{Invocation, ProcessRunner, ToolchainRunner};
