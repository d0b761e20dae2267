//! Core engine for a one-week campus placement drive: interview slot
//! assignment, per-job and per-company capacity quotas, and the consumable
//! token ledger that rate-limits student applications.
//!
//! The surrounding platform (HTTP layer, auth, notification delivery,
//! dashboards) consumes the [`placement::PlacementService`] facade and
//! provides a [`placement::Notifier`] implementation.

pub mod config;
pub mod placement;
pub mod telemetry;
