//! # sealgate-jobs
//!
//! Periodic work for the SEALGATE audit chain.
//!
//! `Scheduler` triggers any `Job` on a `Trigger` (once a day at a fixed UTC
//! time, or at a fixed interval).  `VerifyChainJob` and `PruneJob` wrap
//! `ChainVerifier` and `RetentionPruner` so both run independently against
//! the same store.  Shutdown calls `JobHandle::stop` on each handle.
//!
//! ```rust,ignore
//! let scheduler = Scheduler::new();
//! let verify = scheduler.start(
//!     Arc::new(VerifyChainJob::new(ChainVerifier::new(store.clone()), 10_000)),
//!     Trigger::DailyAt { hour: 2, minute: 0 },
//! )?;
//! // ...
//! verify.stop().await;
//! ```

pub mod scheduler;
pub mod tasks;
pub mod trigger;

pub use scheduler::{JobHandle, Scheduler};
pub use tasks::{PruneJob, VerifyChainJob};
pub use trigger::Trigger;

// ── Tests ─────────────────────────────────────────────────────────────────────
