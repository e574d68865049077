// Copyright 2025 eraflo
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

use crate::InfraError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use spool_core::{FetchError, FetchedAsset, Transport};

/// Fetches assets over HTTP.
///
/// Absolute locators are requested as they are; relative ones are joined to
/// the base URL, when one is configured.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Option<Url>,
}

impl HttpTransport {
    /// Creates a transport without a base URL. Every locator must be absolute.
    pub fn new() -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("spool/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base: None })
    }

    /// Creates a transport resolving relative locators against `base`.
    pub fn with_base_url(base: &str) -> Result<Self, InfraError> {
        let mut base = Url::parse(base).map_err(|e| InfraError::InvalidBaseUrl {
            url: base.to_owned(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base: Some(base),
            ..Self::new()?
        })
    }

    /// The base URL, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Turns a locator into the URL requested.
    pub fn resolve(&self, locator: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::Transport {
            locator: locator.to_owned(),
            message: reason,
        };

        match Url::parse(locator) {
            Ok(url) => Ok(url),
            Err(_) => match &self.base {
                Some(base) => base
                    .join(locator.trim_start_matches('/'))
                    .map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative locator without a base URL".to_owned())),
            },
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_bytes(&self, locator: &str) -> Result<FetchedAsset, FetchError> {
        let transport_error = |e: reqwest::Error| FetchError::Transport {
            locator: locator.to_owned(),
            message: e.to_string(),
        };

        let url = self.resolve(locator)?;
        log::trace!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                locator: locator.to_owned(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_owned());
        let bytes = response.bytes().await.map_err(transport_error)?;

        Ok(FetchedAsset::new(bytes.to_vec(), content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves one canned response per connection.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buffer = [0u8; 1024];
                loop {
                    let read = socket.read(&mut buffer).await.unwrap_or(0);
                    request.extend_from_slice(&buffer[..read]);
                    if read == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{address}/static")
    }

    #[test]
    fn relative_locators_join_the_base() {
        let transport = HttpTransport::with_base_url("https://cdn.test/static").unwrap();
        assert_eq!(
            transport.resolve("/ko/rsp/f0.png").unwrap().as_str(),
            "https://cdn.test/static/ko/rsp/f0.png"
        );
        assert_eq!(
            transport.resolve("https://other.test/f1.png").unwrap().as_str(),
            "https://other.test/f1.png"
        );
    }

    #[test]
    fn relative_locator_without_base_fails() {
        let transport = HttpTransport::new().unwrap();
        assert!(matches!(
            transport.resolve("/f0.png"),
            Err(FetchError::Transport { .. })
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpTransport::with_base_url("not a url"),
            Err(InfraError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn fetches_body_and_content_type() {
        let base = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png; charset=binary\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
        )
        .await;
        let transport = HttpTransport::with_base_url(&base).unwrap();

        let asset = transport.fetch_bytes("/f0.png").await.unwrap();

        assert_eq!(asset.bytes, b"abc");
        assert_eq!(asset.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let base = serve(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let transport = HttpTransport::with_base_url(&base).unwrap();

        let error = transport.fetch_bytes("/missing.png").await.unwrap_err();

        assert!(matches!(error, FetchError::Status { status: 404, .. }));
    }
}
