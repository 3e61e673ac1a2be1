//! Reading and writing the `Cookie` / `Set-Cookie` headers.

use axum::http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue};
use percent_encoding::percent_decode_str;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const SESSION_COOKIE: &str = "sessionid";

/// Looks up `name` in a `Cookie` header string and returns its decoded value.
///
/// Pairs are `;` separated and trimmed; the first pair whose key matches
/// wins. An empty header yields `None`.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    if cookie_header.is_empty() {
        return None;
    }

    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=').unwrap_or((pair.trim(), ""));
        (key == name).then(|| percent_decode_str(value).decode_utf8_lossy().into_owned())
    })
}

/// Same lookup over every `Cookie` header of a request.
pub fn from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| get_cookie(value, name))
}

pub fn set_cookie(name: &str, value: &str, http_only: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    HeaderValue::from_str(&cookie)
}

pub fn expire_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; Max-Age=0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_trimmed_and_decoded_value() {
        let header = "theme=dark; csrftoken=abc%3D%3D;sessionid=xyz";
        assert_eq!(get_cookie(header, "csrftoken").as_deref(), Some("abc=="));
        assert_eq!(get_cookie(header, "sessionid").as_deref(), Some("xyz"));
        assert_eq!(get_cookie(header, "theme").as_deref(), Some("dark"));
    }

    #[test]
    fn missing_or_empty_header_yields_none() {
        assert_eq!(get_cookie("", "csrftoken"), None);
        assert_eq!(get_cookie("a=1; b=2", "csrftoken"), None);
        assert_eq!(get_cookie("xcsrftoken=1", "csrftoken"), None);
    }

    #[test]
    fn value_keeps_everything_after_first_equals() {
        assert_eq!(get_cookie("k=a=b; other=1", "k").as_deref(), Some("a=b"));
        assert_eq!(get_cookie("flag; k=v", "flag").as_deref(), Some(""));
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(get_cookie("k=first; k=second", "k").as_deref(), Some("first"));
    }

    #[test]
    fn reads_across_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("csrftoken=t0k"));
        assert_eq!(from_headers(&headers, CSRF_COOKIE).as_deref(), Some("t0k"));
    }

    #[test]
    fn session_cookie_is_http_only() {
        let value = set_cookie(SESSION_COOKIE, "s1", true).unwrap();
        assert_eq!(value, "sessionid=s1; Path=/; SameSite=Lax; HttpOnly");
        let value = set_cookie(CSRF_COOKIE, "t1", false).unwrap();
        assert_eq!(value, "csrftoken=t1; Path=/; SameSite=Lax");
    }
}
