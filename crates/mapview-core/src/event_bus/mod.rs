//! # Event Bus Module
//!
//! Observer plumbing between a project and the map settings that follow it.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter on event kinds and receive events of interest
//! - Each subscription returns an id that detaches it again
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mapview_core::event_bus::{EventBus, EventFilter, ProjectEvent, ProjectEventKind};
//!
//! let bus: EventBus<ProjectEvent> = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Kinds(vec![ProjectEventKind::CrsChanged]),
//!     |event| println!("{}", event),
//! );
//!
//! bus.publish(ProjectEvent::CrsChanged);
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
