//! # Return-URL Codec
//!
//! The `uenc` parameter carries the page to return to after a store switch.
//! It is standard base64 with `+`, `/`, `=` swapped for `-`, `_`, `~` so
//! the value survives a query string without percent-encoding.
//!
//! Decoding only yields absolute `http`/`https` URLs; anything else would
//! turn the switch endpoint into an open redirect to arbitrary schemes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use url::Url;

/// Errors decoding a `uenc` value.
#[derive(Error, Debug)]
pub enum UrlCodecError {
    /// Not valid base64 after character mapping.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8.
    #[error("decoded URL is not UTF-8")]
    NotUtf8,

    /// Decoded text is not an absolute URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Decoded URL uses a scheme other than http or https.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Encode `url` for the `uenc` parameter.
pub fn encode_url(url: &str) -> String {
    STANDARD
        .encode(url.as_bytes())
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => '~',
            other => other,
        })
        .collect()
}

/// Decode a `uenc` value into an absolute http(s) URL.
///
/// # Errors
///
/// See [`UrlCodecError`].
pub fn decode_url(encoded: &str) -> Result<Url, UrlCodecError> {
    let mapped: String = encoded
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            '~' | ',' => '=',
            other => other,
        })
        .collect();
    let bytes = STANDARD.decode(mapped)?;
    let text = String::from_utf8(bytes).map_err(|_| UrlCodecError::NotUtf8)?;
    let url = Url::parse(&text)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlCodecError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_value_is_query_safe() {
        let encoded = encode_url("http://shop.test/?q=>>>??&p=1");
        assert!(!encoded.contains(['+', '/', '=']));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let original = "https://fr.shop.test/catalog/product/view/id/42?color=red";
        let decoded = decode_url(&encode_url(original)).unwrap();
        assert_eq!(decoded.as_str(), original);
    }

    #[test]
    fn accepts_legacy_comma_padding() {
        let encoded = encode_url("http://a.test/").replace('~', ",");
        assert_eq!(decode_url(&encoded).unwrap().as_str(), "http://a.test/");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode_url("!!!"), Err(UrlCodecError::Base64(_))));
    }

    #[test]
    fn rejects_relative_url() {
        assert!(matches!(
            decode_url(&encode_url("/checkout/cart")),
            Err(UrlCodecError::Url(_))
        ));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(matches!(
            decode_url(&encode_url("javascript:alert(1)")),
            Err(UrlCodecError::UnsupportedScheme(s)) if s == "javascript"
        ));
    }
}
