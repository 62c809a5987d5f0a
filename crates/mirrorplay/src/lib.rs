//! # Mirrorplay Engine
//!
//! Source selection, failover and failback for a video mirrored across
//! several independent delivery providers.
//!
//! A content item carries up to two sources: a primary one on an
//! international CDN and a secondary one on an in-country CDN. The engine
//! picks a starting source from a coarse region hint, watches the load of the
//! active source, fails over to the other one at most once per failure and
//! surfaces a terminal error with retry and manual toggle actions when both
//! are unreachable.
//!
//! ## Layout
//!
//! - [`source`]: providers, sources and locator normalization
//! - [`region`]: region hints derived from injected timezone / locale
//! - [`selector`]: initial selection, failover target and manual toggle
//! - [`controller`]: the failover state machine
//! - [`timer`]: injectable load-timeout scheduling
//! - [`session`]: tokio driver running one controller per content item
//!
//! ## Example
//!
//! ```
//! use mirrorplay_engine::{
//!     Content, ContentRecord, FailoverConfig, FailoverController, ManualScheduler, Phase,
//!     RegionHint,
//! };
//!
//! let record = ContentRecord {
//!     title: "Lesson 1".to_string(),
//!     primary_provider: Some("embedded-cdn-a".to_string()),
//!     primary_locator: Some("https://cdn-a.example/watch?v=v1".to_string()),
//!     secondary_provider: Some("region-cdn".to_string()),
//!     secondary_locator: Some("r1".to_string()),
//! };
//!
//! let mut controller = FailoverController::new(
//!     Content::from_record(&record),
//!     RegionHint::Unknown,
//!     FailoverConfig::default(),
//!     ManualScheduler::new(),
//! );
//! assert_eq!(controller.current_source().unwrap().locator(), "v1");
//!
//! controller.on_load_failed();
//! assert_eq!(controller.phase(), Phase::Loading);
//! assert_eq!(controller.current_source().unwrap().locator(), "r1");
//! ```

pub mod config;
pub mod controller;
mod error;
pub mod region;
pub mod selector;
pub mod session;
pub mod source;
pub mod timer;

pub use config::FailoverConfig;
pub use controller::{
    FailoverController, FailoverEvent, FailureCause, Phase, PlayerView, SelectionReason,
    SelectionState,
};
pub use error::{Error, Result};
pub use region::{RegionHint, RegionPolicy};
pub use session::{DeadlineScheduler, PlaybackSession, SessionHandle};
pub use source::{Content, ContentRecord, ContentSource, Provider, Slot, SourceSet};
pub use timer::{ManualScheduler, TimeoutScheduler, TimerToken};
