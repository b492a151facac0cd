//! # Shopify → Bitrix24 bridge server
//! This module hosts the server code for the bridge. It is responsible for:
//! Listening for incoming order webhook requests from Shopify.
//! Parsing the request body and translating the order into Bitrix24 CRM deal fields.
//! Creating or updating the corresponding deal, its contact and its product rows.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/orders`: The webhook route for receiving `orders/create` and `orders/updated` events from Shopify.

pub mod cli;
pub mod config;
pub mod errors;
pub mod event_log;

pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sync;

pub mod integrations;
pub mod shopify_order;

#[cfg(test)]
mod endpoint_tests;
