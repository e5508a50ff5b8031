//! Larder Core - Shared domain types.
//!
//! This crate provides the domain vocabulary used by every Larder component:
//! - `storefront` - Public-facing e-commerce site
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Cart mutation rules, the order snapshot and the
//! pagination arithmetic live here so they can be exercised without a database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, products, carts, orders and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
