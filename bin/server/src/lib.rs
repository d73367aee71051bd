//! team-pulse HTTP server.
//!
//! Serves the authentication endpoints (Google login, development login,
//! refresh, logout, current user) and the team roster API on top of the
//! stores and services in `team-pulse-platform-access`.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod team_members;
