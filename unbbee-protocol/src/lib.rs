//! AT Command Protocol Engine
//!
//! This crate implements the line-oriented command/response protocol
//! spoken by UNB radio modules (and most other AT-command modems) over a
//! serial byte channel.
//!
//! # Protocol Overview
//!
//! ```text
//!  host ──▶  ATI7<CR>
//!  host ◀──  8622<CR><LF>
//!  host ◀──  OK<CR><LF>
//! ```
//!
//! Commands are terminated by a single CR. Replies are lines terminated by
//! CR+LF, a bare LF, or a bare CR followed by silence. Every exchange ends
//! with a terminal `OK` or `ERROR` line; anything else is payload.
//!
//! All waits are bounded poll loops against an absolute [`Deadline`], and
//! every loop iteration feeds the platform watchdog.
//!
//! # Layout
//!
//! - [`line`] - Line reader (CR / CR+LF / LF ambiguity)
//! - [`command`] - Command framer
//! - [`response`] - Response interpreter (`OK`, `ERROR`, captured values)
//! - [`port`] - [`AtPort`], the engine context all of the above run on

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod command;
pub mod deadline;
pub mod diag;
pub mod line;
pub mod port;
pub mod response;

pub use command::{CommandFragment, COMMAND_DELAY_MS};
pub use deadline::Deadline;
pub use diag::{DiagSink, IoDiag, NoDiag};
pub use line::{LineBuffer, LF_GRACE_MS, LINE_CAPACITY};
pub use port::{AtPort, WATCHDOG_SLICE_MS};
pub use response::{AtError, Captured, DEFAULT_OK_TIMEOUT_MS};
