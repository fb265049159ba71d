//! Network access for the cache router
//!
//! [`Fetcher`] is the seam between the policy executor and the network.
//! [`HttpFetcher`] performs real requests with a blocking `ureq` agent on
//! tokio's blocking pool and classifies the response type the way a
//! browser would relative to the site origin.

use crate::config::schema::NetworkConfig;
use crate::error::{SwError, SwResult};
use crate::http::{origin_of, Request, RequestMode, Response, ResponseType};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, RequestBuilder, ResponseExt};
use url::Url;

/// Performs a single network attempt for a request
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the request. HTTP error statuses are responses, not errors;
    /// only transport failures return `Err`.
    async fn fetch(&self, request: &Request) -> SwResult<Response>;
}

/// Fetcher backed by a `ureq` agent
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    site_origin: String,
    user_agent: String,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher for pages served from `site_origin`
    pub fn new(site_origin: &Url, config: &NetworkConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .save_redirect_history(true)
            .build()
            .into();

        Self {
            agent,
            site_origin: origin_of(site_origin),
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn with_headers<B>(&self, mut builder: RequestBuilder<B>, request: &Request) -> RequestBuilder<B> {
        builder = builder.header("user-agent", self.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    fn fetch_blocking(&self, request: &Request) -> Result<Response, ureq::Error> {
        let mut target = request.url.clone();
        target.set_fragment(None);
        let url = target.as_str();
        let body = request.body.as_deref().unwrap_or_default();

        let mut response = match request.method.as_str() {
            "HEAD" => self.with_headers(self.agent.head(url), request).call()?,
            "DELETE" => self.with_headers(self.agent.delete(url), request).call()?,
            "OPTIONS" => self.with_headers(self.agent.options(url), request).call()?,
            "POST" => self.with_headers(self.agent.post(url), request).send(body)?,
            "PUT" => self.with_headers(self.agent.put(url), request).send(body)?,
            "PATCH" => self.with_headers(self.agent.patch(url), request).send(body)?,
            _ => self.with_headers(self.agent.get(url), request).call()?,
        };

        // The history starts with the requested URI
        let redirected = response
            .get_redirect_history()
            .is_some_and(|history| history.len() > 1);
        let final_url = response.get_uri().to_string();
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_vec()?;

        Ok(Response {
            status,
            kind: response_type(request, &self.site_origin),
            url: final_url,
            redirected,
            headers,
            body,
        })
    }
}

/// Response type a browser would report for this request
pub fn response_type(request: &Request, site_origin: &str) -> ResponseType {
    if request.mode == RequestMode::Navigate || origin_of(&request.url) == site_origin {
        return ResponseType::Basic;
    }
    match request.mode {
        RequestMode::NoCors => ResponseType::Opaque,
        _ => ResponseType::Cors,
    }
}

const SUPPORTED_METHODS: &[&str] = &["GET", "HEAD", "DELETE", "OPTIONS", "POST", "PUT", "PATCH"];

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        if !SUPPORTED_METHODS.contains(&request.method.as_str()) {
            return Err(SwError::network(
                request.url.as_str(),
                format!("unsupported method {}", request.method),
            ));
        }

        let fetcher = self.clone();
        let owned = request.clone();
        let response = tokio::task::spawn_blocking(move || fetcher.fetch_blocking(&owned))
            .await
            .map_err(|e| SwError::Internal(format!("fetch task failed: {}", e)))?
            .map_err(|e| SwError::network(request.url.as_str(), e.to_string()))?;

        debug!(
            url = %request.url,
            status = response.status,
            kind = %response.kind,
            "network response"
        );
        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory network for router tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    #[derive(Clone)]
    enum Outcome {
        Respond(Response),
        Fail,
    }

    #[derive(Default)]
    struct Script {
        outcomes: HashMap<String, Outcome>,
        calls: HashMap<String, usize>,
        offline: bool,
    }

    /// Fetcher that answers from a script and counts calls per URL
    #[derive(Clone, Default)]
    pub struct FakeNetwork {
        script: Arc<Mutex<Script>>,
        gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    }

    impl FakeNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `url` with a same-origin 200 carrying `body`
        pub fn serve(&self, url: &str, body: &str) {
            self.respond(url, Response::basic(url, 200, body));
        }

        pub fn respond(&self, url: &str, response: Response) {
            self.script
                .lock()
                .unwrap()
                .outcomes
                .insert(url.to_string(), Outcome::Respond(response));
        }

        /// Make `url` fail with a transport error
        pub fn fail(&self, url: &str) {
            self.script
                .lock()
                .unwrap()
                .outcomes
                .insert(url.to_string(), Outcome::Fail);
        }

        pub fn set_offline(&self, offline: bool) {
            self.script.lock().unwrap().offline = offline;
        }

        pub fn calls(&self, url: &str) -> usize {
            self.script
                .lock()
                .unwrap()
                .calls
                .get(url)
                .copied()
                .unwrap_or(0)
        }

        /// Block every fetch until [`FakeNetwork::release`]
        pub fn hold(&self) {
            *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
        }

        pub fn release(&self) {
            if let Some(gate) = self.gate.lock().unwrap().take() {
                gate.add_permits(Semaphore::MAX_PERMITS / 2);
            }
        }
    }

    #[async_trait]
    impl Fetcher for FakeNetwork {
        async fn fetch(&self, request: &Request) -> SwResult<Response> {
            let url = request.url.to_string();
            *self
                .script
                .lock()
                .unwrap()
                .calls
                .entry(url.clone())
                .or_default() += 1;

            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                let _permit = gate.acquire().await.unwrap();
            }

            let script = self.script.lock().unwrap();
            if script.offline {
                return Err(SwError::network(&url, "network unreachable"));
            }
            match script.outcomes.get(&url).cloned() {
                Some(Outcome::Respond(response)) => Ok(response),
                Some(Outcome::Fail) => Err(SwError::network(&url, "connection reset")),
                None => Ok(Response::basic(&url, 404, "not found")),
            }
        }
    }
}
