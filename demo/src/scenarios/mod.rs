//! Demo scenarios.
//!
//! | Scenario | Shows |
//! |---|---|
//! | `signing` | Signed refund accepted once; replay, tampering, stale timestamp refused |
//! | `audit_chain` | Append, retention prune with checkpoint, tamper detection |
//! | `jobs` | Scheduled verify and prune jobs, graceful shutdown |

pub mod audit_chain;
pub mod jobs;
pub mod signing;
