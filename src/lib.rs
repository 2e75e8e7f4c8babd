//! precache - offline-first request interception
//!
//! Classifies every outbound request as an app shell asset or dynamic
//! traffic, answers shell assets cache-first and everything else
//! cache-then-network, and keeps responses in versioned cache partitions
//! that are swept when a new generation activates.

pub mod audit;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod manifest;
pub mod net;
pub mod strategy;
pub mod ui;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{PrecacheError, PrecacheResult};
pub use worker::{FetchEvent, Worker};
