use std::time::Instant;

use reqwest::{Method, RequestBuilder, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, warn};
use url::Url;

use tutorlink_auth::TokenStore;
use tutorlink_config::ApiConfig;
use tutorlink_core::{ApiError, PageQuery, Paginated};
use tutorlink_observability::{track_api_error, track_api_request};

use crate::http_request_span;
use crate::utils::tracing::{path_template, record_error, record_http_status};

/// Typed JSON client for the REST backend.
///
/// Cheap to clone: the connection pool and the token store are shared.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::network)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path)?;
        self.send_json(Method::GET, path, request).await
    }

    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path)?.query(query);
        self.send_json(Method::GET, path, request).await
    }

    /// Fetches one page of a list endpoint. `filters` and the page
    /// parameters are both sent as query parameters.
    pub async fn get_page<T, F>(
        &self,
        path: &str,
        filters: &F,
        page: PageQuery,
    ) -> Result<Paginated<T>, ApiError>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let request = self
            .request(Method::GET, path)?
            .query(filters)
            .query(&page.to_pairs());
        self.send_json(Method::GET, path, request).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.send_json(Method::POST, path, request).await
    }

    /// POST whose response body is ignored (actions answering `204 No Content`
    /// or a bare acknowledgement).
    pub async fn post_action<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body);
        self.send(Method::POST, path, request).await.map(|_| ())
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::PATCH, path)?.json(body);
        self.send_json(Method::PATCH, path, request).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, path)?;
        self.send(Method::DELETE, path, request).await.map(|_| ())
    }

    /// Resolves `path` against the base URL, keeping the base's own path
    /// (`http://host/api` + `/tasks/` is `http://host/api/tasks/`).
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| ApiError::invalid_state(format!("Invalid request URL for {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut request = self
            .http
            .request(method, self.url(path)?)
            .header(header::ACCEPT, "application/json");
        if let Some(auth) = self.tokens.authorization_header() {
            request = request.header(header::AUTHORIZATION, auth);
        }
        Ok(request)
    }

    async fn send_json<T>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.send(method, path, request).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(route = %path_template(path), error = %e, "Undecodable response body");
            track_api_error("decode");
            ApiError::decode(e)
        })
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<String, ApiError> {
        let route = path_template(path);
        let span = http_request_span!(method.as_str(), route.as_str());
        dispatch(&method, &route, request).instrument(span).await
    }
}

async fn dispatch(method: &Method, route: &str, request: RequestBuilder) -> Result<String, ApiError> {
    let started = Instant::now();
    let response = request.send().await.map_err(|e| {
        let error = if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::network(&e)
        };
        warn!(error = %e, "Request failed before a response arrived");
        record_error(&error.to_string());
        track_api_error("connectivity");
        error
    })?;

    let status = response.status().as_u16();
    let latency = started.elapsed();
    record_http_status(status);
    track_api_request(method.as_str(), route, status, latency);

    let body = response.text().await.map_err(|e| {
        track_api_error("connectivity");
        ApiError::network(e)
    })?;

    if (200..300).contains(&status) {
        debug!(status, latency_ms = latency.as_millis() as u64, "Request completed");
        Ok(body)
    } else {
        let error = ApiError::from_response(status, &body);
        warn!(status, error = %error, "Request rejected");
        record_error(&error.to_string());
        track_api_error(if status >= 500 { "server" } else { "request" });
        Err(error)
    }
}
