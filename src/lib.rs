//! Company Enrichment Library
//!
//! This library provides the core functionality for the company enrichment
//! CLI: vendor API clients (ZoomInfo, Apollo), the per-row fallback
//! resolver, CSV input/output, and the supporting configuration and retry
//! plumbing.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `domain`: Website to bare-domain sanitizer.
//! - `enrichment`: Per-row enrichment and fallback chains.
//! - `errors`: Error handling types.
//! - `flatten`: Vendor record flattening into output columns.
//! - `models`: Core data models.
//! - `retry`: Retry policy and request pacing.
//! - `services`: Vendor API clients (ZoomInfo, Apollo).
//! - `table`: CSV input table, CRM backfill, and output writing.

pub mod config;
pub mod domain;
pub mod enrichment;
pub mod errors;
pub mod flatten;
pub mod models;
pub mod retry;
pub mod services;
pub mod table;
