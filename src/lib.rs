//! Stockroom inventory core.
//!
//! The inventory ledger and stock-movement engine behind the Stockroom
//! warehouse administration system: site-level stock pools, shelf-level bin
//! allocations, and the append-only movement ledger that ties every quantity
//! change to an actor. Server-side handlers call [`InventoryService`]
//! directly; there is no wire protocol at this layer.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod queries;
pub mod services;

pub use auth::{AuthenticatedUser, Role};
pub use errors::ServiceError;
pub use services::inventory::InventoryService;
