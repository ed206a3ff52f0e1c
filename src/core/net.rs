// src/core/net.rs
// HTTP GET behind a small trait so the cache can be driven by fakes in tests.

use std::io::Read;
use std::time::Duration;

use crate::config::SourceOptions;
use crate::config::consts::USER_AGENT;
use crate::core::cancel::CancelToken;
use crate::error::{MenuError, Result};

/// Document fetch capability: identifier in, bytes out.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    agent: ureq::Agent,
    timeout: Duration,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(opts: &SourceOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(opts.request_timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent, timeout: opts.request_timeout, max_body_bytes: opts.max_body_bytes }
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        cancel.check()?;
        let timeout = cancel.clamp(self.timeout);
        if timeout.is_zero() {
            return Err(MenuError::Cancelled);
        }

        let resp = self.agent.get(url).timeout(timeout).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => MenuError::network(format!("GET {url}: HTTP {code}")),
            ureq::Error::Transport(t) => MenuError::network(format!("GET {url}: {t}")),
        })?;

        let mut buf = Vec::new();
        resp.into_reader()
            .take(self.max_body_bytes + 1)
            .read_to_end(&mut buf)
            .map_err(|e| MenuError::network(format!("GET {url}: failed to read body: {e}")))?;
        if buf.len() as u64 > self.max_body_bytes {
            return Err(MenuError::network(format!(
                "GET {url}: body exceeds {} bytes",
                self.max_body_bytes
            )));
        }
        tracing::debug!(url, bytes = buf.len(), "fetched");
        Ok(buf)
    }
}
