//! Records returned by the membership REST API
//!
//! The source keys are the API's wire contract and must not change.

use crate::record_shape;
use chrono::NaiveDate;
use serde::Serialize;

record_shape! {
    /// A member account (`/api/users`)
    pub struct User {
        added: Timestamp = "added",
        aff_added: Raw = "aff_added",
        aff_custom_redirect: Integer = "aff_custom_redirect",
        aff_id: Raw = "aff_id",
        aff_payout_type: Raw = "aff_payout_type",
        city: Text = "city",
        comment: Text = "comment",
        country: Text = "country",
        disable_lock_until: Timestamp = "disable_lock_until",
        email: Text = "email",
        i_agree: Integer = "i_agree",
        is_affiliate: Integer = "is_affiliate",
        is_approved: Integer = "is_approved",
        is_locked: Integer = "is_locked",
        lang: Text = "lang",
        last_ip: Text = "last_ip",
        last_login: Timestamp = "last_login",
        last_session: Text = "last_session",
        last_user_agent: Text = "last_user_agent",
        /// Natural key of user listings
        login: Text = "login",
        name_f: Text = "name_f",
        name_l: Text = "name_l",
        need_session_refresh: Integer = "need_session_refresh",
        pass: Text = "pass",
        pass_dattm: Timestamp = "pass_dattm",
        phone: Text = "phone",
        remember_key: Text = "remember_key",
        remote_addr: Text = "remote_addr",
        reseller_id: Integer = "reseller_id",
        saved_form_id: Integer = "saved_form_id",
        signup_email_sent: Integer = "signup_email_sent",
        state: Text = "state",
        status: Integer = "status",
        street: Text = "street",
        street2: Text = "street2",
        unsubscribed: Integer = "unsubscribed",
        user_agent: Text = "user_agent",
        user_id: Integer = "user_id",
        zip: Text = "zip",
        company_name: Text = "company_name",
        company_address: Text = "company_address",
        tax_id: Text = "taxid",
        /// Latest access expiry, filled in by expired-user reports
        expired_at: Timestamp = "expired_at",
    }
}

record_shape! {
    /// An invoice with its attached accesses, line items and payments (`/api/invoices`)
    pub struct Invoice {
        invoice_id: Integer = "invoice_id",
        user_id: Integer = "user_id",
        paysys_id: Text = "paysys_id",
        currency: Text = "currency",
        first_subtotal: Decimal = "first_subtotal",
        first_discount: Decimal = "first_discount",
        first_tax: Decimal = "first_tax",
        first_shipping: Decimal = "first_shipping",
        first_total: Decimal = "first_total",
        first_period: Text = "first_period",
        rebill_times: Integer = "rebill_times",
        second_subtotal: Decimal = "second_subtotal",
        second_discount: Decimal = "second_discount",
        second_tax: Decimal = "second_tax",
        second_shipping: Decimal = "second_shipping",
        second_total: Decimal = "second_total",
        second_period: Text = "second_period",
        tax_rate: Raw = "tax_rate",
        tax_type: Raw = "tax_type",
        tax_title: Raw = "tax_title",
        status: Integer = "status",
        coupon_id: Integer = "coupon_id",
        coupon_code: Text = "coupon_code",
        discount_first: Decimal = "discount_first",
        discount_second: Decimal = "discount_second",
        is_confirmed: Integer = "is_confirmed",
        public_id: Text = "public_id",
        invoice_key: Text = "invoice_key",
        tm_added: Timestamp = "tm_added",
        tm_started: Timestamp = "tm_started",
        tm_cancelled: Timestamp = "tm_cancelled",
        rebill_date: Timestamp = "rebill_date",
        due_date: Timestamp = "due_date",
        terms: Raw = "terms",
        comment: Raw = "comment",
        base_currency_multi: Text = "base_currency_multi",
        saved_form_id: Integer = "saved_form_id",
        aff_id: Raw = "aff_id",
        keyword_id: Raw = "keyword_id",
        remote_addr: Raw = "remote_addr",
    }
    nested InvoiceNested {
        access: Access = "access",
        invoice_items: Item = "invoice-items",
        invoice_payments: Payment = "invoice-payments",
    }
}

record_shape! {
    /// A product access grant (`/api/access`)
    pub struct Access {
        access_id: Integer = "access_id",
        invoice_id: Integer = "invoice_id",
        invoice_public_id: Text = "invoice_public_id",
        invoice_payment_id: Integer = "invoice_payment_id",
        invoice_item_id: Integer = "invoice_item_id",
        user_id: Integer = "user_id",
        product_id: Integer = "product_id",
        transaction_id: Text = "transaction_id",
        begin_date: Timestamp = "begin_date",
        expire_date: Timestamp = "expire_date",
        qty: Integer = "qty",
        comment: Text = "comment",
        product_title: Text = "product_title",
        status: Flag = "status",
        product_description: Text = "product_description",
        spend: Decimal = "spend",
        spend_covered_by_plan: Decimal = "spend_covered_by_plan",
        overage: Decimal = "overage",
        projected_spend: Decimal = "projected_spend",
        projected_overage: Decimal = "projected_overage",
    }
}

impl Access {
    /// Whether the access is still valid on `today`
    ///
    /// Compares whole days: an access expiring today is active, one that
    /// expired yesterday is not. An access without an expiry date is not.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.expire_date.is_some_and(|expires| expires.date() >= today)
    }
}

record_shape! {
    /// A payment against an invoice (`/api/invoice-payments`)
    pub struct Payment {
        conversion_track_done: Integer = "conversion-track-done",
        google_analytics_done: Integer = "google-analytics-done",
        invoice_payment_id: Integer = "invoice_payment_id",
        invoice_id: Integer = "invoice_id",
        invoice_public_id: Text = "invoice_public_id",
        user_id: Integer = "user_id",
        paysys_id: Text = "paysys_id",
        receipt_id: Text = "receipt_id",
        transaction_id: Text = "transaction_id",
        dattm: Timestamp = "dattm",
        currency: Text = "currency",
        amount: Decimal = "amount",
        discount: Decimal = "discount",
        tax: Decimal = "tax",
        shipping: Decimal = "shipping",
        refund_dattm: Timestamp = "refund_dattm",
        refund_amount: Decimal = "refund_amount",
        base_currency_multi: Decimal = "base_currency_multi",
        display_invoice_id: Text = "display_invoice_id",
        username: Text = "username",
        payment_item_description: Text = "payment_item_description",
        payment_item_title: Text = "payment_item_title",
        refunded: Flag = "refunded",
    }
}

record_shape! {
    /// A catalog product (`/api/products`)
    pub struct Product {
        cart_description: Text = "cart_description",
        comment: Text = "comment",
        currency: Text = "currency",
        default_billing_plan_id: Integer = "default_billing_plan_id",
        description: Text = "description",
        img: Integer = "img",
        img_cart_path: Text = "img_cart_path",
        img_detail_path: Text = "img_detail_path",
        img_orig_path: Text = "img_orig_path",
        img_path: Text = "img_path",
        is_archived: Integer = "is_archived",
        is_disabled: Integer = "is_disabled",
        is_tangible: Integer = "is_tangible",
        meta_description: Text = "meta_description",
        meta_keywords: Text = "meta_keywords",
        meta_robots: Text = "meta_robots",
        meta_title: Text = "meta_title",
        path: Text = "path",
        paysys_id: Text = "paysys_id",
        prevent_if_other: Text = "prevent_if_other",
        product_id: Integer = "product_id",
        renewal_group: Text = "renewal_group",
        require_other: Text = "require_other",
        sort_order: Integer = "sort_order",
        start_date: Timestamp = "start_date",
        start_date_fixed: Timestamp = "start_date_fixed",
        tags: Text = "tags",
        tax_digital: Text = "tax_digital",
        tax_group: Text = "tax_group",
        tax_rate_group: Text = "tax_rate_group",
        thanks_redirect_url: Text = "thanks_redirect_url",
        title: Text = "title",
        trial_group: Text = "trial_group",
        url: Text = "url",
    }
}

record_shape! {
    /// An invoice line item (only ever seen nested under an invoice)
    pub struct Item {
        billing_plan_data: Text = "billing_plan_data",
        billing_plan_id: Integer = "billing_plan_id",
        currency: Text = "currency",
        first_discount: Decimal = "first_discount",
        first_period: Text = "first_period",
        first_price: Decimal = "first_price",
        first_shipping: Decimal = "first_shipping",
        first_tax: Decimal = "first_tax",
        first_total: Decimal = "first_total",
        invoice_id: Integer = "invoice_id",
        invoice_item_id: Integer = "invoice_item_id",
        invoice_public_id: Text = "invoice_public_id",
        is_countable: Integer = "is_countable",
        is_tangible: Raw = "is_tangible",
        item_description: Text = "item_description",
        item_id: Integer = "item_id",
        item_title: Text = "item_title",
        item_type: Text = "item_type",
        option1: Raw = "option1",
        option2: Raw = "option2",
        option3: Raw = "option3",
        options: Raw = "options",
        qty: Integer = "qty",
        rebill_times: Integer = "rebill_times",
        second_discount: Decimal = "second_discount",
        second_period: Text = "second_period",
        second_price: Decimal = "second_price",
        second_shipping: Decimal = "second_shipping",
        second_tax: Decimal = "second_tax",
        second_total: Decimal = "second_total",
        tax_group: Text = "tax_group",
        tax_rate: Raw = "tax_rate",
        variable_qty: Integer = "variable_qty",
    }
}

/// A user together with their access grants
///
/// Owns copies of the accesses; nothing is shared with other listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Membership {
    pub user: User,
    pub accesses: Vec<Access>,
}

impl Membership {
    /// Accesses still valid on `today`
    pub fn active_accesses(&self, today: NaiveDate) -> impl Iterator<Item = &Access> {
        self.accesses.iter().filter(move |a| a.is_active_on(today))
    }
}
