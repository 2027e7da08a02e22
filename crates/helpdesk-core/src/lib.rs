//! Core types, policies, and the ticket lifecycle service for the helpdesk.
//!
//! This crate has no HTTP or database dependencies.
//! Storage plugs in through [`store::HelpdeskStore`]; time, identity, and
//! notifications come in through [`clock`], [`identity`], and [`notify`].

pub mod clock;
pub mod directory;
pub mod error;
pub mod identity;
pub mod notify;
pub mod query;
pub mod service;
pub mod sla;
pub mod stats;
pub mod store;
pub mod ticket;

pub use error::{Error, Result};
pub use service::Helpdesk;
