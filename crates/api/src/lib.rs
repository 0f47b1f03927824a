//! Slotwise API - multi-tenant appointment booking backend.
//!
//! # Architecture
//!
//! - Axum JSON API serving both frontend clients (business dashboard and
//!   customer booking client)
//! - CQRS-style request pipeline: every command/query passes through
//!   validation, tenant stamping, logging/timing, and caching behaviors
//!   before its handler ([`pipeline`])
//! - `PostgreSQL` via sqlx repositories with soft delete and audit stamping
//!   ([`db`])
//! - moka read-through cache for list/settings/availability queries
//!   ([`cache`])
//! - JWT bearer auth with rotated opaque refresh tokens ([`services::auth`])

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
