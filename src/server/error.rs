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

//! Request-level error type for the HTTP API.
//!
//! # Error Categories
//!
//! - Client input errors: malformed bodies, unknown sensor categories (400)
//! - Authentication errors: missing or wrong API key (401)
//! - Rate limiting: blocked client identifier (429 with `Retry-After`)
//! - Configuration errors: no API key configured on the server (500)
//!
//! All of them are recovered per request; none of them is fatal to the process.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by the HTTP handlers and the authentication gate.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not valid JSON of the expected shape.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The sensor category in the path is not part of the schema.
    #[error("Unknown sensor category: {0}")]
    UnknownSensor(String),

    /// No API key was supplied with a write request.
    #[error("API key required")]
    MissingCredential,

    /// The supplied API key does not match the configured one.
    #[error("Invalid API key")]
    InvalidCredential,

    /// The client identifier is currently blocked.
    #[error("Too many failed authentication attempts. Please try again later.")]
    RateLimited {
        /// Seconds until the block expires.
        retry_after_secs: u64,
    },

    /// The server has no API key configured, so every write fails closed.
    #[error("Server configuration error")]
    CredentialNotConfigured,
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_) | ApiError::UnknownSensor(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::CredentialNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, self.to_string()).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}
