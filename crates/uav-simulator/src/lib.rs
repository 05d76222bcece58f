//! # UAV Simulator
//!
//! Simulation and fan-out engine for the UAV radar.
//!
//! ## Features
//!
//! - UAV spawning inside a circular radar zone
//! - Random-walk motion with boundary correction
//! - Population growth and retirement cycles
//! - Snapshot-then-stream delivery to any number of observers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐   step/spawn    ┌──────────────────────┐
//! │        Simulator         │ ──────────────▶ │     MotionModel      │
//! │  (growth + motion tick)  │                 └──────────────────────┘
//! └──────────────────────────┘
//!        │ insert/remove              │ publish
//!        ▼                            ▼
//! ┌──────────────────────────┐  snapshot  ┌──────────────────────────┐
//! │        UavStore          │ ─────────▶ │       Broadcaster        │
//! │   (source of truth)      │            │ (per-observer channels)  │
//! └──────────────────────────┘            └──────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod motion;
pub mod scheduler;
pub mod store;

pub use broadcast::{Broadcaster, SharedBroadcaster, SubscriberId, SubscriberState, Subscription};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use motion::{LifecycleOdds, MotionModel};
pub use scheduler::{MotionReport, Simulator};
pub use store::{SharedUavStore, UavStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
