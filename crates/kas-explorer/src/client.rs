//! HTTP transport for explorer requests.

use async_trait::async_trait;

use kas_protocol::{Endpoint, ExplorerRequest, ExplorerResponse, ProtocolError};

/// Longest slice of an error body kept in a status error.
const ERROR_BODY_PREVIEW: usize = 200;

/// Something that can answer explorer requests.
#[async_trait]
pub trait ExplorerBackend: Send + Sync {
    async fn explore(
        &self,
        endpoint: &Endpoint,
        request: &ExplorerRequest,
    ) -> Result<ExplorerResponse, ProtocolError>;
}

/// Explorer backend reached over HTTP.
///
/// No timeout is applied; a hung backend leaves the request in flight.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, ProtocolError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("kas-explorer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ExplorerBackend for HttpBackend {
    async fn explore(
        &self,
        endpoint: &Endpoint,
        request: &ExplorerRequest,
    ) -> Result<ExplorerResponse, ProtocolError> {
        let url = endpoint.explore_url();
        tracing::debug!(
            %url,
            state = %request.state,
            predicate = %request.predicate,
            args = request.args.len(),
            "posting explorer request"
        );

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(ERROR_BODY_PREVIEW)
                    .collect(),
            });
        }

        let decoded = ExplorerResponse::from_slice(&body)?;
        tracing::debug!(
            state = %decoded.state,
            valid = decoded.valid,
            children = decoded.children.len(),
            "explorer response decoded"
        );
        Ok(decoded)
    }
}
