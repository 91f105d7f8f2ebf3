//! High-level membership API client
//!
//! One method per listing. Every listing walks all pages and returns a
//! [`Listing`]: the merged records plus the error that cut the walk short,
//! if any.

use crate::config::Config;
use crate::database::{DatabaseEngine, PaymentSummary};
use crate::decode::{
    Diagnostic, DiagnosticKind, DiagnosticSink, FieldMapper, TracingSink, NESTED_KEY,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpPageSource};
use crate::models::{Access, Invoice, Membership, Payment, Product, User};
use crate::pagination::{Listing, PageRequest, PageSource, Paginator, Params, DEFAULT_PAGE_SIZE};
use crate::temporal::Timestamp;
use chrono::{Local, NaiveDate, TimeDelta, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Endpoint paths below the API root
pub mod endpoints {
    pub const USERS: &str = "users";
    pub const INVOICES: &str = "invoices";
    pub const ACCESS: &str = "access";
    pub const PAYMENTS: &str = "invoice-payments";
    pub const PRODUCTS: &str = "products";
    pub const PRODUCT_CATEGORIES: &str = "product-product-category";
}

/// Nested sub-resource holding a user's access grants
const ACCESS_NESTED: &str = "access";

/// Shape name used for product-category diagnostics
const CATEGORY_SHAPE: &str = "ProductCategory";

/// Client for the membership REST API and, optionally, its relational mirror
pub struct MemberClient {
    source: Box<dyn PageSource>,
    sink: Box<dyn DiagnosticSink>,
    page_size: u32,
    database: Option<DatabaseEngine>,
}

impl MemberClient {
    /// Create a client over any page source
    pub fn new(source: Box<dyn PageSource>, sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            source,
            sink,
            page_size: DEFAULT_PAGE_SIZE,
            database: None,
        }
    }

    /// Build the HTTP client, tracing sink and optional database from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let http = HttpClient::with_config(config.http_client_config())?;
        let source = HttpPageSource::new(http, config.api_key.clone());
        let mut client = Self::new(Box::new(source), Box::new(TracingSink))
            .with_page_size(config.page_size);

        if let Some(db) = &config.database {
            client = client.with_database(DatabaseEngine::new(db)?);
        }

        Ok(client)
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Attach the relational mirror
    #[must_use]
    pub fn with_database(mut self, engine: DatabaseEngine) -> Self {
        self.database = Some(engine);
        self
    }

    /// The relational mirror, if one is attached
    pub fn database(&self) -> Result<&DatabaseEngine> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::config("no database configured"))
    }

    fn paginator(&self) -> Paginator<'_> {
        Paginator::new(&*self.source, &*self.sink).with_page_size(self.page_size)
    }

    fn mapper(&self) -> FieldMapper<'_> {
        FieldMapper::new(&*self.sink)
    }

    // ========================================================================
    // Listings
    // ========================================================================

    /// Users keyed by login
    pub fn users(&self, params: &Params) -> Listing<HashMap<String, User>> {
        self.paginator().collect_keyed(
            endpoints::USERS,
            params,
            |u: &User| u.login.clone(),
            |_| true,
        )
    }

    /// Invoices keyed by id, with any nested children requested in `params`
    pub fn invoices(&self, params: &Params) -> Listing<HashMap<i64, Invoice>> {
        self.paginator().collect_keyed(
            endpoints::INVOICES,
            params,
            |i: &Invoice| i.invoice_id,
            |_| true,
        )
    }

    /// Access grants grouped by user id, as of today
    pub fn accesses(&self, params: &Params, active_only: bool) -> Listing<HashMap<i64, Vec<Access>>> {
        self.accesses_on(params, active_only, today())
    }

    /// Access grants grouped by user id
    ///
    /// With `active_only`, grants that expired before `today` are dropped.
    pub fn accesses_on(
        &self,
        params: &Params,
        active_only: bool,
        today: NaiveDate,
    ) -> Listing<HashMap<i64, Vec<Access>>> {
        self.paginator().collect_grouped(
            endpoints::ACCESS,
            params,
            |a: &Access| a.user_id,
            |a| !active_only || a.is_active_on(today),
        )
    }

    /// Payments keyed by id
    pub fn payments(&self, params: &Params) -> Listing<HashMap<i64, Payment>> {
        self.paginator().collect_keyed(
            endpoints::PAYMENTS,
            params,
            |p: &Payment| p.invoice_payment_id,
            |_| true,
        )
    }

    /// Products keyed by id
    pub fn products(&self, params: &Params) -> Listing<HashMap<i64, Product>> {
        self.paginator().collect_keyed(
            endpoints::PRODUCTS,
            params,
            |p: &Product| p.product_id,
            |_| true,
        )
    }

    /// Users with their access grants, keyed by login, as of today
    pub fn memberships(
        &self,
        params: &Params,
        active_only: bool,
    ) -> Listing<HashMap<String, Membership>> {
        self.memberships_on(params, active_only, today())
    }

    /// Users with their access grants, keyed by login
    ///
    /// The `access` sub-resource is always requested. With `active_only`,
    /// only grants still valid on `today` are attached, and a user whose
    /// row carries no nested wrapper is left out. Without it, such a user is
    /// kept with no grants.
    pub fn memberships_on(
        &self,
        params: &Params,
        active_only: bool,
        today: NaiveDate,
    ) -> Listing<HashMap<String, Membership>> {
        let mut params = params.clone();
        params.push_nested(ACCESS_NESTED);
        let mapper = self.mapper();

        self.paginator().fold_rows(
            endpoints::USERS,
            &params,
            HashMap::new(),
            |acc: &mut HashMap<String, Membership>, row_key, row| {
                let Some(user) = mapper.decode_value::<User>(row_key, row) else {
                    return;
                };

                let accesses = match row.get(NESTED_KEY) {
                    Some(Value::Object(nested)) => {
                        mapper.decode_list::<Access>(ACCESS_NESTED, nested.get(ACCESS_NESTED))
                    }
                    _ if active_only => return,
                    _ => Vec::new(),
                };

                let accesses = if active_only {
                    accesses
                        .into_iter()
                        .filter(|a| a.is_active_on(today))
                        .collect()
                } else {
                    accesses
                };

                acc.insert(user.login.clone(), Membership { user, accesses });
            },
        )
    }

    /// Category ids of every product, keyed by product id
    ///
    /// The endpoint is fetched once, without pagination. It maps category
    /// ids to product id strings; ids that are not integers are reported
    /// and skipped.
    pub fn product_categories(&self) -> Listing<HashMap<i64, BTreeSet<i64>>> {
        let mut categories: HashMap<i64, BTreeSet<i64>> = HashMap::new();

        let envelope = match self
            .source
            .fetch(&PageRequest::single(endpoints::PRODUCT_CATEGORIES, Params::new()))
        {
            Ok(envelope) => envelope,
            Err(err) => return Listing::partial(categories, err),
        };

        for (category_key, products) in envelope.rows() {
            let Ok(category_id) = category_key.parse::<i64>() else {
                self.report_category(category_key, Value::String(category_key.to_string()));
                continue;
            };

            let Value::Array(products) = products else {
                self.sink.report(Diagnostic::new(
                    CATEGORY_SHAPE,
                    category_key,
                    products.clone(),
                    DiagnosticKind::MalformedRow,
                ));
                continue;
            };

            for product in products {
                match parse_id(product) {
                    Some(product_id) => {
                        categories.entry(product_id).or_default().insert(category_id);
                    }
                    None => self.report_category(category_key, product.clone()),
                }
            }
        }

        debug!(products = categories.len(), "product categories loaded");
        Listing::complete(categories)
    }

    fn report_category(&self, key: &str, raw: Value) {
        self.sink.report(Diagnostic::new(
            CATEGORY_SHAPE,
            key,
            raw,
            DiagnosticKind::Unparseable {
                reason: "not an integer id".to_string(),
            },
        ));
    }

    /// Users whose access expired more than `days` days ago, as of now
    pub fn expired_users(&self, days: u32) -> Listing<HashMap<String, User>> {
        self.expired_users_at(days, Timestamp::new(Utc::now().fixed_offset()))
    }

    /// Users whose every access grant expired more than `days` days before `now`
    ///
    /// `expired_at` is set to the latest expiry. A user with any grant
    /// expiring later (or in the future) is left out. Grants without an
    /// expiry date are ignored, so a user without dated grants is kept with
    /// no `expired_at`.
    ///
    /// When `error` is set the report is unreliable: users whose grants were
    /// never fetched show up as expired.
    pub fn expired_users_at(&self, days: u32, now: Timestamp) -> Listing<HashMap<String, User>> {
        let (users, users_err) = self.users(&Params::new()).into_parts();
        let (accesses, access_err) = self
            .accesses_on(&Params::new(), false, now.date())
            .into_parts();
        let window = TimeDelta::days(i64::from(days));

        let mut expired = HashMap::new();
        'users: for (login, mut user) in users {
            let mut latest: Option<Timestamp> = None;

            for access in accesses.get(&user.user_id).into_iter().flatten() {
                let Some(expires) = access.expire_date else {
                    continue;
                };
                if now.inner() - expires.inner() < window {
                    continue 'users;
                }
                latest = latest.max(Some(expires));
            }

            user.expired_at = latest;
            info!(
                login = %login,
                expired = %latest.map(|t| t.date().to_string()).unwrap_or_default(),
                "user expired"
            );
            expired.insert(login, user);
        }

        match users_err.or(access_err) {
            Some(err) => Listing::partial(expired, err),
            None => Listing::complete(expired),
        }
    }

    // ========================================================================
    // Relational mirror reports
    // ========================================================================

    /// Payments made on `day` (see [`DatabaseEngine::payments_by_date`])
    pub fn payments_by_date(
        &self,
        day: NaiveDate,
        item_title: &str,
        item_description: &str,
    ) -> Result<HashMap<String, PaymentSummary>> {
        self.database()?
            .payments_by_date(day, item_title, item_description)
    }

    /// Refunds issued on `day` (see [`DatabaseEngine::refunds_by_date`])
    pub fn refunds_by_date(
        &self,
        day: NaiveDate,
        item_title: &str,
    ) -> Result<HashMap<String, PaymentSummary>> {
        self.database()?.refunds_by_date(day, item_title)
    }
}

impl std::fmt::Debug for MemberClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberClient")
            .field("page_size", &self.page_size)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
