//! # eventdrip
//!
//! **eventdrip** is a mock HTTP server used as a test fixture for streaming
//! HTTP clients, built on the `may` coroutine runtime.
//!
//! ## Overview
//!
//! The server accepts any request, determines a target event count from the
//! request path (or a configured default), and drips newline-terminated
//! `Event emitted: N` lines to the client as a chunked `text/plain` response
//! at a fixed tick interval. A stream ends in one of two ways:
//!
//! - the count is reached and the response is terminated with the empty
//!   trailing chunk, or
//! - the client disconnects and the response is terminated with a final
//!   `Cancelled.` payload.
//!
//! `GET /250` streams 250 lines; `GET /abc` (or any path without a decimal
//! count) streams the configured default. There is deliberately no routing
//! table, no TLS, no auth, and no backpressure: the whole point of the
//! fixture is a predictable, slow, cancellable chunked body.
//!
//! ## Architecture
//!
//! - **[`runtime_config`]** - environment-driven configuration (port, default
//!   count, tick interval, coroutine stack size)
//! - **[`server`]** - accept loop, request-head parsing, chunked response
//!   writing, and the [`server::StreamService`] seam
//! - **[`stream`]** - the per-request [`stream::StreamSession`] emission loop
//!   and the connection-close watcher
//!
//! Concurrency model: one coroutine for the acceptor, one per connection,
//! plus one close watcher per stream. Sessions share no state with each
//! other; the only cross-coroutine value is each session's cancellation
//! flag.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eventdrip::runtime_config::RuntimeConfig;
//! use eventdrip::{EventStreamService, HttpServer};
//!
//! let config = RuntimeConfig::from_env();
//! let server = HttpServer(EventStreamService::new(&config));
//! let handle = server.start(("0.0.0.0", config.port))?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod runtime_config;
pub mod server;
pub mod stream;

pub use server::{EventStreamService, HttpServer, ServerHandle, StreamService};
