//! cart-sync - Abandoned-cart synchronization into a marketing automation platform
//!
//! This crate resolves abandoned-cart records to platform contacts, tags
//! them, and writes the cart value into a custom field. Every platform call
//! goes through a single client that backs off when the platform throttles.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod platform;
pub mod source;
pub mod sync;
