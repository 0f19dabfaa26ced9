//! Session lifecycle and authenticated-request core for the club app.
//!
//! Two pieces cooperate here: the [`services::SessionStore`], the single
//! source of truth for authentication state with write-through persistence
//! and the token refresh protocol, and the [`services::ApiGateway`], which
//! attaches the current bearer token to outbound requests and recovers from
//! a single token expiry. Screens consume both and never touch durable
//! storage directly.

pub mod config;
pub mod models;
pub mod services;

pub use services::{
    ApiGateway, LoginSession, MockObserver, RequestOptions, SessionObserver, SessionSnapshot,
    SessionStore,
};
