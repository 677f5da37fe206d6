//! Request Dispatcher - Concurrent Fetch, Independent Settlement
//!
//! Every descriptor gets exactly one request. All requests are in flight at
//! once and the caller resumes only when each one has either produced a body
//! or failed. Results come back in input order, never completion order.

use async_trait::async_trait;
use futures::future::join_all;
use std::time::Duration;
use thiserror::Error;

use crate::request::{ConstantSpec, RequestDescriptor};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{status} - {body:?}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Network(String),
}

/// Successful response from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    /// Final URI after redirects, when the transport knows it.
    pub resolved_uri: Option<String>,
}

/// Issues a single request for a descriptor. Timeouts, if any, belong here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, descriptor: &RequestDescriptor) -> Result<Fetched, TransportError>;
}

/// Failure reason recorded for a rejected entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RequestFailure {
    pub message: String,
    pub descriptor: RequestDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Fulfilled { value: String, uri: String },
    Rejected(RequestFailure),
}

impl Settlement {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }
}

/// Fetches every entry of `spec` concurrently and returns one settlement per
/// entry, aligned with the spec's iteration order.
pub async fn dispatch<T>(transport: &T, spec: &ConstantSpec) -> Vec<Settlement>
where
    T: Transport + ?Sized,
{
    tracing::debug!(count = spec.len(), "dispatching requests");
    join_all(spec.descriptors().map(|d| settle(transport, d))).await
}

async fn settle<T>(transport: &T, descriptor: &RequestDescriptor) -> Settlement
where
    T: Transport + ?Sized,
{
    match transport.fetch(descriptor).await {
        Ok(fetched) => {
            let uri = fetched.resolved_uri.unwrap_or_else(|| descriptor.display_uri());
            tracing::debug!(%uri, "request fulfilled");
            Settlement::Fulfilled { value: fetched.body, uri }
        }
        Err(e) => {
            tracing::debug!(uri = %descriptor.display_uri(), error = %e, "request rejected");
            Settlement::Rejected(RequestFailure {
                message: e.to_string(),
                descriptor: descriptor.clone(),
            })
        }
    }
}

/// Production transport backed by `reqwest`. Non-2xx responses are failures.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("remote-constants/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()? })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, descriptor: &RequestDescriptor) -> Result<Fetched, TransportError> {
        let mut request = self.client.get(&descriptor.url);
        if !descriptor.query.is_empty() {
            request = request.query(&descriptor.query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let resolved_uri = Some(response.url().to_string());
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        Ok(Fetched { body, resolved_uri })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Barrier;

    /// Answers from a table; the delay makes later entries finish first.
    struct TableTransport {
        answers: HashMap<String, (u64, Result<String, u16>)>,
    }

    #[async_trait]
    impl Transport for TableTransport {
        async fn fetch(&self, d: &RequestDescriptor) -> Result<Fetched, TransportError> {
            let (delay, answer) = self
                .answers
                .get(&d.url)
                .cloned()
                .unwrap_or((0, Err(599)));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            match answer {
                Ok(body) => Ok(Fetched { body, resolved_uri: None }),
                Err(status) => Err(TransportError::Status { status, body: String::new() }),
            }
        }
    }

    #[tokio::test]
    async fn test_results_follow_input_order_not_completion_order() {
        let transport = TableTransport {
            answers: HashMap::from([
                ("http://slow".to_string(), (40, Ok("1".to_string()))),
                ("http://bad".to_string(), (20, Err(500))),
                ("http://fast".to_string(), (0, Ok("3".to_string()))),
            ]),
        };
        let spec: ConstantSpec = vec![
            ("A", RequestDescriptor::new("http://slow")),
            ("B", RequestDescriptor::new("http://bad")),
            ("C", RequestDescriptor::new("http://fast")),
        ]
        .into_iter()
        .collect();

        let results = dispatch(&transport, &spec).await;

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0],
            Settlement::Fulfilled { value: "1".into(), uri: "http://slow".into() }
        );
        assert!(results[1].is_rejected());
        assert_eq!(
            results[2],
            Settlement::Fulfilled { value: "3".into(), uri: "http://fast".into() }
        );
    }

    #[tokio::test]
    async fn test_rejection_keeps_descriptor() {
        let transport = TableTransport { answers: HashMap::new() };
        let spec: ConstantSpec =
            vec![("X", RequestDescriptor::new("http://gone").with_query("v", "2"))]
                .into_iter()
                .collect();

        let results = dispatch(&transport, &spec).await;

        match &results[0] {
            Settlement::Rejected(failure) => {
                assert_eq!(failure.descriptor.display_uri(), "http://gone?v=2");
                assert!(failure.message.starts_with("599"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_spec_settles_immediately() {
        let transport = TableTransport { answers: HashMap::new() };
        assert!(dispatch(&transport, &ConstantSpec::new()).await.is_empty());
    }

    /// Answers only once every expected request is waiting at the barrier.
    struct GatedTransport {
        gate: Arc<Barrier>,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn fetch(&self, d: &RequestDescriptor) -> Result<Fetched, TransportError> {
            self.gate.wait().await;
            Ok(Fetched { body: d.url.clone(), resolved_uri: None })
        }
    }

    #[tokio::test]
    async fn test_all_requests_are_in_flight_together() {
        let transport = GatedTransport { gate: Arc::new(Barrier::new(3)) };
        let spec: ConstantSpec = ["http://a", "http://b", "http://c"]
            .into_iter()
            .enumerate()
            .map(|(i, url)| (format!("K{}", i), RequestDescriptor::new(url)))
            .collect();

        let results = tokio::time::timeout(Duration::from_secs(5), dispatch(&transport, &spec))
            .await
            .expect("requests were not issued concurrently");

        assert!(results.iter().all(Settlement::is_fulfilled));
        assert_eq!(
            results[2],
            Settlement::Fulfilled { value: "http://c".into(), uri: "http://c".into() }
        );
    }
}
