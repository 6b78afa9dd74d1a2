//! Storefront backend: product catalog, cookie-session auth, and a
//! checkout pipeline that reconciles payment-provider webhooks with
//! inventory, guaranteeing exactly-once stock deduction per paid order.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod models;
pub mod pagination;
pub mod payments;
pub mod rate_limit;
pub mod response;
