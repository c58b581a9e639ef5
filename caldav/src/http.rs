// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication and `ETag` handling.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};

use crate::config::{AuthMethod, CalDavConfig};
use crate::error::CalDavError;
use crate::types::{ETag, Href};

/// HTTP client for `CalDAV` operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    auth: AuthMethod,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: &CalDavConfig) -> Result<Self, CalDavError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            auth: config.auth.clone(),
        })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        match &self.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::None => {}
        }

        req
    }

    /// Builds a request for a `WebDAV` extension method such as PROPFIND.
    ///
    /// # Errors
    ///
    /// Returns an error if the method name is not a valid token.
    pub fn build_dav_request(&self, method: &str, url: Url) -> Result<RequestBuilder, CalDavError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| CalDavError::Http(format!("Invalid method: {e}")))?;
        Ok(self.build_request(method, url))
    }

    /// Executes a request and maps error status codes.
    ///
    /// `href` names the target resource in `NotFound` errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or returns an error status code.
    pub async fn execute(&self, req: RequestBuilder, href: &Href) -> Result<Response, CalDavError> {
        let resp = req.send().await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(CalDavError::Auth(status.to_string()))
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(CalDavError::NotFound(href.clone())),
            StatusCode::PRECONDITION_FAILED => Err(CalDavError::PreconditionFailed(
                Self::extract_etag(&resp).map_or_else(|| "unknown".to_string(), |e| e.to_string()),
            )),
            status => {
                let text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read response".to_string());
                Err(CalDavError::Http(format!("{status}: {text}")))
            }
        }
    }

    /// Extracts `ETag` from response headers, if the server sent one.
    pub fn extract_etag(resp: &Response) -> Option<ETag> {
        resp.headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| ETag::new(s.to_string()))
    }
}
