//! socialhub - A small social network and book catalog JSON API
//!
//! Users register and authenticate with an opaque token, follow each other,
//! write posts, comment on and like them, and receive notifications. A
//! separate catalog serves authors and their books.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
