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

//! [`Transport`](spool_core::Transport) implementations.

mod fs;
#[cfg(feature = "http")]
mod http;

pub use fs::FsTransport;
#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Guesses a content type from the extension of a path or URL.
pub fn content_type_for(locator: &str) -> Option<&'static str> {
    let path = strip_query(locator);
    let (_, extension) = path.rsplit_once('.')?;
    let content_type = match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "ron" => "application/ron",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(content_type)
}

/// Drops the query string and fragment of a locator.
pub(crate) fn strip_query(locator: &str) -> &str {
    let end = locator.find(['?', '#']).unwrap_or(locator.len());
    &locator[..end]
}
