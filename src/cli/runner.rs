//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, ListArgs};
use crate::client::MemberClient;
use crate::config::{Config, DatabaseConfig};
use crate::error::{Error, Result};
use crate::pagination::{Listing, Params};
use serde::Serialize;
use tracing::{debug, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// A listing cut short by an error is still printed before the error is
    /// returned.
    pub fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = MemberClient::from_config(&config)?;
        debug!(?client, "client ready");

        match &self.cli.command {
            Commands::Users(list) => self.print_listing(client.users(&params(list))),
            Commands::Invoices(list) => self.print_listing(client.invoices(&params(list))),
            Commands::Access { list, active_only } => {
                self.print_listing(client.accesses(&params(list), *active_only))
            }
            Commands::Payments(list) => self.print_listing(client.payments(&params(list))),
            Commands::Products(list) => self.print_listing(client.products(&params(list))),
            Commands::Memberships { list, active_only } => {
                self.print_listing(client.memberships(&params(list), *active_only))
            }
            Commands::ProductCategories => self.print_listing(client.product_categories()),
            Commands::ExpiredUsers { days } => self.print_listing(client.expired_users(*days)),
            Commands::PaymentsByDate {
                date,
                title,
                description,
            } => self.print(&client.payments_by_date(*date, title, description)?),
            Commands::RefundsByDate { date, title } => {
                self.print(&client.refunds_by_date(*date, title)?)
            }
        }
    }

    /// Config file, then environment, then flags
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply_env();
        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut Config) {
        if let Some(url) = &self.cli.api_url {
            config.api_url.clone_from(url);
        }
        if let Some(key) = &self.cli.api_key {
            config.api_key.clone_from(key);
        }
        if let Some(page_size) = self.cli.page_size {
            config.page_size = page_size;
        }
        if self.cli.db_url.is_some() || self.cli.db_engine.is_some() {
            let db = config.database.get_or_insert_with(DatabaseConfig::default);
            if let Some(url) = &self.cli.db_url {
                db.connection_string = Some(url.clone());
            }
            if let Some(engine) = self.cli.db_engine {
                db.engine = engine;
            }
        }
    }

    fn print_listing<T: Serialize>(&self, listing: Listing<T>) -> Result<()> {
        let (records, error) = listing.into_parts();
        self.print(&records)?;

        match error {
            Some(err) => {
                warn!(error = %err, "listing incomplete");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = self
            .cli
            .format
            .render(value)
            .map_err(|e| Error::Other(format!("Failed to render output: {e}")))?;
        println!("{rendered}");
        Ok(())
    }
}

fn params(list: &ListArgs) -> Params {
    let mut params = Params::new();
    for (column, value) in &list.filters {
        params = params.with_filter(column.as_str(), value.as_str());
    }
    for nested in &list.nested {
        params.push_nested(nested.as_str());
    }
    params
}
