//! UNBbee Hardware Abstraction Layer
//!
//! This crate defines the platform traits the AT command engine runs on.
//! A board support crate implements them once for its UART, timer and
//! watchdog, and the same engine code runs unchanged on any of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (modem bring-up, etc.)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  unbbee-driver / unbbee-protocol        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  unbbee-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  IoChannel    │       │  board HAL    │
//! │ (embedded-io) │       │  (custom)     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`channel::ByteChannel`] - Non-blocking byte stream with peek
//! - [`time::Clock`] - Monotonic millisecond clock
//! - [`time::Watchdog`] - Liveness tick for long poll loops
//!
//! Delays use [`embedded_hal::delay::DelayNs`] directly.

#![no_std]
#![deny(unsafe_code)]

pub mod channel;
pub mod io;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod time;

// Re-export key traits at crate root for convenience
pub use channel::{ByteChannel, DataBits, Parity, SerialConfig, StopBits};
pub use io::IoChannel;
pub use time::{Clock, NoWatchdog, Watchdog};
