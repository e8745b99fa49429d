//! reqwest-backed HTTP client.

use reqwest::blocking::Client;
use sessync_engine::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Blocking HTTP client with basic authentication.
pub struct ReqwestClient {
    client: Client,
    username: String,
    password: String,
}

impl ReqwestClient {
    /// Builds a client for `username` / `password`.
    pub fn new(username: String, password: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("sessync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            username,
            password,
        })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header(reqwest::header::ACCEPT, "application/json")
            .basic_auth(&self.username, Some(&self.password))
            .timeout(request.timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout(e.to_string())
                } else if e.is_connect() {
                    HttpError::Connect(e.to_string())
                } else {
                    HttpError::Other(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| HttpError::Other(e.to_string()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}
