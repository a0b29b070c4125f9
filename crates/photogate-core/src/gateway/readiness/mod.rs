//! Backend Readiness Module
//!
//! Answers "is the compute backend up yet?" without ever raising:
//! - One-shot health check bounded by the probe timeout
//! - Bounded polling wait used at startup and by the `probe` command
//! - Process-wide advisory snapshot refreshed in the background
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ReadinessTracker                                            │
//! │  ├── snapshot: RwLock<ReadinessSnapshot>   (advisory only)  │
//! │  ├── refresher: background task driving ReadinessProbe      │
//! │  └── shutdown: watch channel                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod probe;
mod tracker;


pub use probe::{ProbeOutcome, ReadinessProbe};
pub use tracker::ReadinessTracker;
