//! remuxd - continuous video conversion service for remote file hosting
//!
//! This library crate exposes the core functionality for integration testing.

pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod media;
pub mod pipeline;
pub mod probe;
pub mod proxy;
pub mod remote;
