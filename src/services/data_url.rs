//! `data:` URL encoding for self-contained images.
//!
//! Only the base64 form is produced or accepted; that is what canvas and
//! `FileReader` emit and what the history mirror stores.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::types::errors::DataUrlError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Encodes `bytes` as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("{}{}{},{}", SCHEME, mime, BASE64_MARKER, BASE64.encode(bytes))
}

/// Cheap shape check: a `data:` scheme followed somewhere by a `,` separator.
/// Does not decode the payload.
pub fn is_data_url(s: &str) -> bool {
    strip_scheme(s).is_some_and(|rest| rest.contains(','))
}

/// Returns the MIME type declared in the header without decoding the payload.
pub fn mime_of(s: &str) -> Result<String, DataUrlError> {
    let (header, _) = split(s)?;
    Ok(header_mime(header))
}

/// Parses and decodes a base64 data URL.
pub fn parse(s: &str) -> Result<DataUrl, DataUrlError> {
    let (header, payload) = split(s)?;
    if !header.to_ascii_lowercase().ends_with(BASE64_MARKER) {
        return Err(DataUrlError::NotBase64(header.to_string()));
    }
    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;
    Ok(DataUrl {
        mime: header_mime(header),
        data,
    })
}

fn split(s: &str) -> Result<(&str, &str), DataUrlError> {
    strip_scheme(s)
        .ok_or(DataUrlError::MissingScheme)?
        .split_once(',')
        .ok_or(DataUrlError::MissingSeparator)
}

fn strip_scheme(s: &str) -> Option<&str> {
    let scheme = s.get(..SCHEME.len())?;
    if scheme.eq_ignore_ascii_case(SCHEME) {
        s.get(SCHEME.len()..)
    } else {
        None
    }
}

// An empty media type defaults to text/plain per RFC 2397.
fn header_mime(header: &str) -> String {
    let mime = header.split(';').next().unwrap_or_default().trim();
    if mime.is_empty() {
        "text/plain".to_string()
    } else {
        mime.to_ascii_lowercase()
    }
}
