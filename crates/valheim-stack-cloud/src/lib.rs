//! valheim-stack change planning
//!
//! Compares a freshly synthesized template with the previous one and
//! classifies every difference the way the provisioning engine will apply
//! it. Applying the plan is left to the engine.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐
//! │  snapshot    │    │  synthesize  │
//! │ (last synth) │    │  (current)   │
//! └──────┬───────┘    └──────┬───────┘
//!        └────────┬──────────┘
//!                 ▼
//!            diff() ──► Plan { create / update / replace / delete / no-op }
//! ```

pub mod action;
pub mod diff;
pub mod error;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ChangeScope, Plan, PlanSummary};
pub use diff::{diff, requires_replacement};
pub use error::{CloudError, Result};
pub use state::{Snapshot, SnapshotStore};
