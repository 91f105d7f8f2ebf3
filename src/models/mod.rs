//! Typed records
//!
//! - [`api`]: records decoded from the REST API through the field mapper
//! - [`shape`]: the `record_shape!` macro that declares them

pub mod api;
pub mod shape;

pub use api::{Access, Invoice, InvoiceNested, Item, Membership, Payment, Product, User};
