//! HTTP transport backed by `reqwest`

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{
    AddPlayerRequest, ErrorBody, IncrementTicketsRequest, PlayerEnvelope, PlayerTransport,
    PlayersEnvelope, SetTicketsRequest, SpinEnvelope, SpinRequest, SpinTransport, TicketIdsQuery,
    TicketTransport, TicketsEnvelope, TransportFuture, UpdatePlayerRequest,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Talks to the players, tickets and spin services over HTTP
///
/// All three services are reached through one base URL. Cloning is cheap;
/// the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `config.base_url` with `config.request_timeout`
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[tracing::instrument(level = "debug", skip(self, request))]
    async fn execute<T>(&self, route: &'static str, request: RequestBuilder) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { route }
            } else {
                TransportError::RequestFailed {
                    route,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| TransportError::Decode {
                    route,
                    message: e.to_string(),
                });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|parsed| parsed.error)
            .filter(|error| !error.is_empty())
            .unwrap_or(body);

        tracing::debug!(route, status = status.as_u16(), %message, "non-success response");

        Err(TransportError::Status {
            route,
            status: status.as_u16(),
            message,
        })
    }
}

impl PlayerTransport for HttpTransport {
    fn list_players(&self) -> TransportFuture<'_, PlayersEnvelope> {
        let request = self.client.get(self.url("/players"));
        Box::pin(self.execute("GET /players", request))
    }

    fn add_player(&self, request: AddPlayerRequest) -> TransportFuture<'_, PlayerEnvelope> {
        let request = self.client.post(self.url("/players")).json(&request);
        Box::pin(self.execute("POST /players", request))
    }

    fn update_player(&self, request: UpdatePlayerRequest) -> TransportFuture<'_, PlayerEnvelope> {
        let request = self.client.put(self.url("/players")).json(&request);
        Box::pin(self.execute("PUT /players", request))
    }
}

impl TicketTransport for HttpTransport {
    fn get_tickets(&self, query: TicketIdsQuery) -> TransportFuture<'_, TicketsEnvelope> {
        let request = self.client.get(self.url("/tickets")).query(&query);
        Box::pin(self.execute("GET /tickets", request))
    }

    fn increment_tickets(
        &self,
        request: IncrementTicketsRequest,
    ) -> TransportFuture<'_, TicketsEnvelope> {
        let request = self.client.post(self.url("/tickets/increment")).json(&request);
        Box::pin(self.execute("POST /tickets/increment", request))
    }

    fn set_tickets(&self, request: SetTicketsRequest) -> TransportFuture<'_, TicketsEnvelope> {
        let request = self.client.put(self.url("/tickets")).json(&request);
        Box::pin(self.execute("PUT /tickets", request))
    }
}

impl SpinTransport for HttpTransport {
    fn spin(&self, request: SpinRequest) -> TransportFuture<'_, SpinEnvelope> {
        let request = self.client.post(self.url("/spin")).json(&request);
        Box::pin(self.execute("POST /spin", request))
    }

    fn last_spin(&self) -> TransportFuture<'_, SpinEnvelope> {
        let request = self.client.get(self.url("/get-last-spin"));
        Box::pin(self.execute("GET /get-last-spin", request))
    }
}
