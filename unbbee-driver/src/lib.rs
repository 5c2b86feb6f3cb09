//! UNB radio module driver
//!
//! This crate provides the session layer applications use to talk to a
//! UNB (ultra narrow band) radio module such as the TD120x family:
//!
//! - Echo suppression (`ATE0`), done once per session
//! - Send a command and wait for `OK`
//! - Send a query and capture its value line
//! - Device identity query (`ATI7`)
//! - Payload transmission (`AT$SS=`)
//!
//! The protocol itself lives in `unbbee-protocol`; platform access goes
//! through the traits in `unbbee-hal`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod session;

pub use config::SessionConfig;
pub use session::{Session, ValueError};
pub use unbbee_protocol::{AtError, AtPort, Captured};
