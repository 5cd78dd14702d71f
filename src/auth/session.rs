use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};

pub const SESSION_COOKIE_NAME: &str = "authToken";

/// Build the `Set-Cookie` value carrying the session token.
///
/// `SameSite=None` is required for the cross-origin frontend, and browsers
/// reject it without `Secure`, so both are always set.
pub fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=None; Secure; Max-Age={max_age_secs}"
    ))
}

/// `Set-Cookie` value that drops the session cookie on logout.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("authToken=; Path=/; HttpOnly; SameSite=None; Secure; Max-Age=0")
}

/// Pull the session token out of the request's `Cookie` header, if present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME).then(|| val.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn cookie_carries_required_attributes() {
        let value = session_cookie("abc.def.ghi", 604800).expect("cookie value");
        let value = value.to_str().expect("ascii");
        assert!(value.starts_with("authToken=abc.def.ghi;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=None"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Max-Age=604800"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let value = clear_session_cookie();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn extracts_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; authToken=tok123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_session_token(&headers), None);
    }
}
