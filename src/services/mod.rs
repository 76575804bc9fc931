//! Service layer: URL resolution, reconciliation and platform sync.
//!
//! Services hold no UI concerns and are shared by the CLI and the webhook
//! server.

pub mod backfill;
pub mod maintenance;
pub mod reconcile;
pub mod resolver;
pub mod sync;

pub use backfill::{Backfill, BackfillReport};
pub use maintenance::{run_maintenance, MaintenanceReport};
pub use reconcile::{EngineConfig, Outcome, ReconciliationEngine};
pub use resolver::ContentResolver;
pub use sync::{ConnectionStatus, SyncFailure, SyncOrchestrator, SyncReport};
