#![allow(dead_code)]
mod tls_upstream_mock;

pub use tls_upstream_mock::{refused_addr, MockTlsUpstream, UpstreamBehavior};
