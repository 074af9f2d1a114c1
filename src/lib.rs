//! # rangeserve
//!
//! A small static file server built for seekable media: it answers
//! single-range `Range` requests with correct 206 framing, streams file
//! bytes in bounded chunks, and attaches a permissive CORS header set to
//! every response so browser players on other origins can scrub freely.
//!
//! The crate splits into a protocol layer ([`http`]: range decisions,
//! bodies, builders), a handler layer ([`handler`]: path resolution,
//! directory listings, dispatch), and a server layer ([`server`]: listener
//! and connection lifecycle), with [`config`] and [`logger`] supporting
//! both.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
