//! SMS Relay Server
//!
//! Accepts inbound SMS webhooks from a telephony gateway, publishes them on a
//! pub/sub channel and streams them to every connected viewer, each of which
//! keeps a bounded history of recent messages.

pub mod api;
pub mod broker;
pub mod config;
pub mod publisher;
pub mod subscriber;
pub mod viewer;
pub mod webhook;
pub mod ws;
