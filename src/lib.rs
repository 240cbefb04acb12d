//! # corehttp
//!
//! A from-scratch HTTP/1.x server framework.
//!
//! This crate implements the per-connection request pipeline of an HTTP/1.x server: the
//! byte-level request parser (including chunked transfer decoding and percent-decoding of
//! target URIs), the streaming request body reader, the response renderer, the keep-alive
//! connection lifecycle, and the path router that dispatches a parsed request to a handler.
//!
//! ## Definitions
//!
//! - [`arena`] the per-connection growable byte buffer backing parsed tokens
//! - [`kv`] the ordered, duplicate-key-aware key/value container used for headers, query and params
//! - [`percent`] percent-encoding decoder for URI components
//! - [`method`], [`version`], [`status`] HTTP semantics primitives
//!
//! ## Protocol
//!
//! - [`h1`] HTTP/1.x wire format: request parser, chunked decoder, body reader
//!
//! ## Request / Response
//!
//! - [`request`] the parsed [`Request`](request::Request) handed to handlers
//! - [`response`] the fluent [`Response`](response::Response) builder
//! - [`render`] serializes a [`Response`](response::Response) onto a connection
//!
//! ## Routing
//!
//! - [`router`] maps `(method, path)` to a handler, with middleware and error handlers
//!
//! ## Serving
//!
//! - [`connection`] owns the read/parse/dispatch/render loop for one socket
//! - [`server`] accepts connections and spawns one task per connection
//! - [`config`] recognized server-wide tunables
#![warn(missing_debug_implementations)]

mod log;
mod matches;

pub mod arena;
pub mod kv;
pub mod percent;

pub mod method;
pub mod version;
pub mod status;
pub mod error;
pub mod env;
pub mod cookie;

pub mod h1;
pub mod body;
pub mod query;
pub mod multipart;

pub mod request;
pub mod response;
pub mod render;

pub mod router;
pub mod connection;
pub mod config;
pub mod server;

pub use error::{Error, ErrorKind};
pub use method::Method;
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use version::Version;
