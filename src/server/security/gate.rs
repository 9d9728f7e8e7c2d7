// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! API key gate for write requests.
//!
//! The gate runs in front of every mutating route:
//!
//! 1. Derive the client identifier (forwarded header or peer address)
//! 2. Reject blocked clients with 429 before looking at credentials
//! 3. Fail closed with 500 when the server has no API key configured
//! 4. Accept a bearer token or an `X-API-Key` header, compared exactly
//! 5. Record every missing or wrong key against the client identifier
//!
//! A successful request never clears the client's failure record.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::rate_limit::AuthRateLimiter;
use crate::server::error::ApiError;

/// Header carrying the address of the original client behind a proxy.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Dedicated API key header, consulted when no bearer token is present.
pub const API_KEY_HEADER: &str = "x-api-key";

const BEARER_PREFIX: &str = "Bearer ";

/// Identifier used to bucket failed authentication attempts.
///
/// Inserted into the request extensions by [`require_api_key`] so handlers
/// can attribute writes in their logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Create a client identifier from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared state of the authentication gate.
#[derive(Debug, Clone)]
pub struct AuthGate {
    limiter: AuthRateLimiter,
    api_key: Option<Arc<str>>,
    trusted_proxies: Arc<[IpAddr]>,
}

impl AuthGate {
    /// Create a gate that checks against `api_key`.
    ///
    /// A missing or empty key leaves the gate unconfigured: every request
    /// that is not already blocked is answered with a configuration error.
    pub fn new(limiter: AuthRateLimiter, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.is_empty()).map(Arc::from);
        Self {
            limiter,
            api_key,
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    /// Only honour the forwarded-for header when the peer is one of these
    /// addresses. With an empty list the header is trusted from anyone.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    /// The rate limiter backing this gate.
    pub fn limiter(&self) -> &AuthRateLimiter {
        &self.limiter
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Derive the client identifier for a request.
    ///
    /// A non-empty forwarded-for header wins over the peer address unless a
    /// trusted proxy list is configured and the peer is not on it. The
    /// header value is client-controlled, so without a proxy list a client
    /// can pick its own bucket.
    pub fn client_id(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientId {
        let peer_ip = peer.map(|addr| addr.ip());

        let forwarded = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(forwarded) = forwarded {
            let trusted = self.trusted_proxies.is_empty()
                || peer_ip.is_some_and(|ip| self.trusted_proxies.contains(&ip));
            if trusted {
                return ClientId::new(forwarded);
            }
        }

        match peer_ip {
            Some(ip) => ClientId::new(ip.to_string()),
            None => ClientId::new("unknown"),
        }
    }

    /// Decide whether a write request from `client` may proceed.
    pub async fn check(&self, client: &ClientId, headers: &HeaderMap) -> Result<(), ApiError> {
        if self.limiter.is_blocked(client.as_str()).await {
            let retry_after_secs = self.limiter.retry_after_secs(client.as_str()).await;
            tracing::warn!(
                client = %client,
                retry_after_secs,
                "Rejected write request from blocked client"
            );
            return Err(ApiError::RateLimited { retry_after_secs });
        }

        let Some(expected) = self.api_key.as_deref() else {
            tracing::error!("No API key configured; rejecting write request");
            return Err(ApiError::CredentialNotConfigured);
        };

        let Some(provided) = extract_api_key(headers) else {
            self.limiter.record_failure(client.as_str()).await;
            tracing::warn!(client = %client, "Write request without API key");
            return Err(ApiError::MissingCredential);
        };

        if provided != expected {
            self.limiter.record_failure(client.as_str()).await;
            tracing::warn!(client = %client, "Invalid API key attempt");
            return Err(ApiError::InvalidCredential);
        }

        Ok(())
    }
}

/// Extract the supplied API key from the request headers.
///
/// `Authorization: Bearer <key>` takes precedence; `X-API-Key` is used when
/// there is no usable bearer token. Empty values count as absent.
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|key| !key.is_empty())
    })
}

/// Axum middleware enforcing [`AuthGate`] on the wrapped routes.
pub async fn require_api_key(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = gate.client_id(request.headers(), peer);

    if let Err(err) = gate.check(&client, request.headers()).await {
        return err.into_response();
    }

    request.extensions_mut().insert(client);
    next.run(request).await
}
