//! Outbound HTTP through the host.

use std::collections::BTreeMap;

use plugwire_engine::{HostInterface, PluginResult};
use plugwire_primitives::MemoryHandle;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn default_method() -> String {
    "GET".to_string()
}

/// Request descriptor, sent to the host as structured text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> PluginResult<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    pub fn json<T: DeserializeOwned>(&self) -> PluginResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Send `request` with an optional body and wait for the response.
pub fn request(
    host: &mut dyn HostInterface,
    request: &HttpRequest,
    body: Option<&[u8]>,
) -> PluginResult<HttpResponse> {
    let descriptor = host.allocate(&serde_json::to_vec(request)?)?;
    let body = match body {
        Some(bytes) => host.allocate(bytes)?,
        None => MemoryHandle::NULL,
    };

    let response = host.http_request(descriptor, body)?;
    let status = host.http_status_code()?;
    let bytes = host
        .resolve(response.offset())
        .map(|region| host.read_bytes(region))
        .unwrap_or_default();

    host.free(descriptor);
    host.free(body);
    host.free(response);
    Ok(HttpResponse { status, body: bytes })
}
