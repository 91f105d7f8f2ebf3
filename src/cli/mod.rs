//! CLI module
//!
//! Command-line interface over the membership client.
//!
//! # Commands
//!
//! - `users`, `invoices`, `access`, `payments`, `products` - Paginated listings
//! - `memberships` - Users with their access grants
//! - `product-categories` - Category ids per product
//! - `expired-users` - Users whose access lapsed
//! - `payments-by-date`, `refunds-by-date` - Reports over the relational mirror

mod commands;
mod runner;

pub use commands::{Cli, Commands, ListArgs};
pub use runner::Runner;
