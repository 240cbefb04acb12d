//! Server-wide configuration.
use std::time::Duration;

use crate::kv::KvList;

/// Parser-enforced limits. All are configurable; defaults are generous enough for ordinary
/// browser and API traffic while still bounding worst-case memory use per connection.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_method_len: usize,
    pub max_path_len: usize,
    pub max_header_count: usize,
    pub max_header_key_len: usize,
    pub max_header_value_len: usize,
    pub max_headers_total_bytes: usize,
    pub max_body_size: u64,
    pub max_chunk_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_method_len: 16,
            max_path_len: 8 * 1024,
            max_header_count: 128,
            max_header_key_len: 256,
            max_header_value_len: 8 * 1024,
            max_headers_total_bytes: 64 * 1024,
            max_body_size: 16 * 1024 * 1024,
            max_chunk_size: 8 * 1024 * 1024,
        }
    }
}

/// Tri-state keep-alive override. `Default` means "follow the protocol rules in
/// [`crate::render`]"; `Always`/`Never` force the decision regardless of request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeepAlive {
    #[default]
    Default,
    Always,
    Never,
}

/// Flat record of recognized server options.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of the per-connection fixed read buffer.
    pub read_buffer_size: usize,
    /// Applies to each individual read while awaiting more bytes for the current request.
    pub read_timeout: Duration,
    /// Deadline handed to handlers via the request's environment; handlers are expected to
    /// cooperate, the driver does not forcibly cancel handler futures mid-flight.
    pub handler_timeout: Duration,
    pub limits: Limits,
    pub default_content_type: String,
    pub default_headers: KvList,
    pub keep_alive: KeepAlive,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_buffer_size: 8 * 1024,
            read_timeout: Duration::from_secs(30),
            handler_timeout: Duration::from_secs(30),
            limits: Limits::default(),
            default_content_type: "text/html".to_string(),
            default_headers: KvList::new(),
            keep_alive: KeepAlive::default(),
        }
    }
}
