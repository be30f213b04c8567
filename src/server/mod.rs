pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{read_request, requested_count, ParsedRequest};
pub use service::{EventStreamService, StreamService};
