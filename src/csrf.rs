use crate::cookies::{self, CSRF_COOKIE};
use crate::errors::AppError;
use axum::{
    extract::Request,
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

pub const CSRF_HEADER: &str = "x-csrftoken";

/// Per-request view of the CSRF token, inserted by [`csrf_layer`].
#[derive(Debug, Clone)]
pub struct CsrfToken {
    value: String,
    from_cookie: bool,
    header_matches: bool,
}

impl CsrfToken {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Passes when the request carried the cookie and echoed it back either
    /// in the `X-CSRFToken` header or in the submitted form field.
    pub fn verify(&self, form_field: Option<&str>) -> Result<(), AppError> {
        if !self.from_cookie {
            warn!("rejected request without csrf cookie");
            return Err(AppError::forbidden("CSRF cookie not set."));
        }
        if self.header_matches || form_field.is_some_and(|field| field == self.value) {
            return Ok(());
        }
        warn!("rejected request with wrong csrf token");
        Err(AppError::forbidden("CSRF token missing or incorrect."))
    }
}

pub async fn csrf_layer(mut request: Request, next: Next) -> Response {
    let existing = cookies::from_headers(request.headers(), CSRF_COOKIE).filter(|v| !v.is_empty());
    let header_matches = match (
        existing.as_deref(),
        request.headers().get(CSRF_HEADER).and_then(|v| v.to_str().ok()),
    ) {
        (Some(cookie), Some(sent)) => cookie == sent,
        _ => false,
    };

    let token = CsrfToken {
        from_cookie: existing.is_some(),
        value: existing.unwrap_or_else(new_token),
        header_matches,
    };
    let issue = !token.from_cookie;
    let value = token.value.clone();
    request.extensions_mut().insert(token);

    let mut response = next.run(request).await;
    if issue {
        if let Ok(cookie) = cookies::set_cookie(CSRF_COOKIE, &value, false) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    response
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(from_cookie: bool, header_matches: bool) -> CsrfToken {
        CsrfToken {
            value: "t0ken".into(),
            from_cookie,
            header_matches,
        }
    }

    #[test]
    fn header_match_passes() {
        assert!(token(true, true).verify(None).is_ok());
    }

    #[test]
    fn form_field_match_passes() {
        assert!(token(true, false).verify(Some("t0ken")).is_ok());
        assert!(token(true, false).verify(Some("other")).is_err());
        assert!(token(true, false).verify(None).is_err());
    }

    #[test]
    fn freshly_minted_token_never_passes() {
        let err = token(false, false).verify(Some("t0ken")).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::FORBIDDEN);
    }
}
