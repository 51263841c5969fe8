//! Public API for readback.
//!
//! This module contains all user-facing types and functions.
//! Most users should only interact with types from this module.

pub mod config;
pub mod request;
pub mod service;
pub mod stats;

pub(crate) mod hooks;
