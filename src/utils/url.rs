//! URL utilities for consistent URL handling
//!
//! This module builds Generative Language API endpoints from a base URL
//! and a model id, normalizing trailing slashes so the result never
//! carries doubled separators.

/// Default API root for the hosted backend.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Normalize a base URL by removing trailing slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Streaming completion endpoint for a model, with SSE framing selected
/// via `alt=sse`.
pub fn construct_stream_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:streamGenerateContent?alt=sse",
        normalize_base_url(base_url),
        model
    )
}
