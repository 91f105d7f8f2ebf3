//! CLI commands and argument parsing

use crate::types::{DatabaseKind, OutputFormat};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// aMember membership API client
#[derive(Parser, Debug)]
#[command(name = "amember-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API root, e.g. https://members.example.com/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// REST API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Rows requested per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Relational mirror connection string (mysql://... or a DuckDB path)
    #[arg(long, global = true)]
    pub db_url: Option<String>,

    /// Relational mirror backend
    #[arg(long, global = true)]
    pub db_engine: Option<DatabaseKind>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Filters and nested sub-resources shared by the listing commands
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Exact-match filter, repeatable (`--filter status=1`)
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Nested sub-resource to embed, repeatable (`--nested access`)
    #[arg(long = "nested")]
    pub nested: Vec<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List users keyed by login
    Users(ListArgs),

    /// List invoices keyed by id
    Invoices(ListArgs),

    /// List access grants grouped by user id
    Access {
        #[command(flatten)]
        list: ListArgs,

        /// Drop grants that already expired
        #[arg(long)]
        active_only: bool,
    },

    /// List payments keyed by id
    Payments(ListArgs),

    /// List products keyed by id
    Products(ListArgs),

    /// List users with their access grants
    Memberships {
        #[command(flatten)]
        list: ListArgs,

        /// Only attach grants still valid today
        #[arg(long)]
        active_only: bool,
    },

    /// Category ids of every product
    ProductCategories,

    /// Users whose every grant expired more than N days ago
    ExpiredUsers {
        /// Days since the latest expiry
        #[arg(long)]
        days: u32,
    },

    /// Paid, non-refunded payments on a day (needs the relational mirror)
    PaymentsByDate {
        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Text the line item title must contain
        #[arg(long, default_value = "")]
        title: String,

        /// Text the line item description must contain
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Refunds issued on a day (needs the relational mirror)
    RefundsByDate {
        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Text the line item title or description must contain
        #[arg(long, default_value = "")]
        title: String,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got '{raw}'")),
    }
}
