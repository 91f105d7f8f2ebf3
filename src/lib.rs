// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # aMember Client
//!
//! Typed access to the aMember membership REST API and to the relational
//! database that mirrors it.
//!
//! ## Features
//!
//! - **Lenient decoding**: API payloads carry strings where numbers and
//!   dates are expected; every field is coerced on its own and failures
//!   are reported as diagnostics instead of aborting the record
//! - **Date parsing**: The date layouts the API emits, recognized by shape
//! - **Pagination**: Every listing walks all pages and merges them by key
//! - **Condition compiler**: Parameterized `WHERE` clauses for the mirror
//! - **Reports**: Payments and refunds by day, read straight from the mirror
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use amember_client::{Config, MemberClient, Params};
//!
//! let mut config = Config::load("amember.yaml")?;
//! config.apply_env();
//!
//! let client = MemberClient::from_config(&config)?;
//! let listing = client.memberships(&Params::new(), true);
//! for (login, membership) in &listing.records {
//!     println!("{login}: {} active grants", membership.accesses.len());
//! }
//! if let Some(err) = listing.error {
//!     eprintln!("listing incomplete: {err}");
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         MemberClient                         │
//! │  users  invoices  access  payments  products  memberships    │
//! │  product_categories  expired_users  payments/refunds_by_date │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                                 │
//! ┌───────────────┴───────────────┐   ┌─────────────┴────────────┐
//! │ Paginator → PageSource (HTTP) │   │ DatabaseEngine (DuckDB)  │
//! │ FieldMapper → DiagnosticSink  │   │ Condition compiler       │
//! │ Timestamp parser              │   │ MySQL attached read-only │
//! └───────────────────────────────┘   └──────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Date and time parsing
pub mod temporal;

/// Payload decoding and diagnostics
pub mod decode;

/// Typed API records
pub mod models;

/// HTTP transport
pub mod http;

/// Page walking and merging
pub mod pagination;

/// SQL condition compiler
pub mod query;

/// Relational mirror via DuckDB
pub mod database;

/// Client configuration
pub mod config;

/// High-level membership client
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::MemberClient;
pub use config::{Config, DatabaseConfig};
pub use error::{Error, Result};
pub use pagination::{Listing, Params};
pub use temporal::{parse_timestamp, Timestamp};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
