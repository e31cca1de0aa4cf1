use http::HeaderMap;
use http::header::AUTHORIZATION;
use std::collections::HashSet;

/// Pass/fail gate supplied by the host integration. The groups API only
/// consumes the decision; issuing and verifying credentials happens elsewhere.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Accepts `Authorization: Bearer <token>` for any token in a fixed set.
pub struct StaticTokenAuthorizer {
    tokens: HashSet<String>,
}

impl StaticTokenAuthorizer {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        StaticTokenAuthorizer {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn authorize(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| self.tokens.contains(token))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_static_tokens() {
        let authorizer = StaticTokenAuthorizer::new(["secret"]);

        assert!(authorizer.authorize(&headers("Bearer secret")));
        assert!(authorizer.authorize(&headers("bearer secret")));
        assert!(!authorizer.authorize(&headers("Bearer other")));
        assert!(!authorizer.authorize(&headers("Basic secret")));
        assert!(!authorizer.authorize(&headers("Bearer ")));
        assert!(!authorizer.authorize(&HeaderMap::new()));
    }

    #[test]
    fn test_no_tokens_rejects_everything() {
        let authorizer = StaticTokenAuthorizer::new(Vec::<String>::new());
        assert!(!authorizer.authorize(&headers("Bearer secret")));
    }
}
