//! Core types shared across IFNS facilities
//!
//! This crate provides the canonical schema constants used by both the
//! error and logging facilities:
//!
//! - **Field keys**: structured logging field names
//! - **Event names**: operation boundary events (`start`, `end`, `end_error`)

pub mod schema;
