//! Endpoint reachability probes.

mod http;

pub use http::HttpEndpointProbe;
