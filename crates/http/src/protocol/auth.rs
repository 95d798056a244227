use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Credentials carried by an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Bearer(String),
    Basic { username: String, password: String },
    ApiKey(String),
    Other { scheme: String, credentials: String },
}

impl Authorization {
    /// Parses a raw header value of the form `<scheme> <credentials>`.
    ///
    /// Scheme names are matched case-insensitively. A `Basic` value that is
    /// not valid base64 `user:password` yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, credentials) = value.trim().split_once(' ')?;
        let credentials = credentials.trim();
        if credentials.is_empty() {
            return None;
        }

        if scheme.eq_ignore_ascii_case("bearer") {
            Some(Self::Bearer(credentials.to_string()))
        } else if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD.decode(credentials).ok()?;
            let decoded = String::from_utf8(decoded).ok()?;
            let (username, password) = decoded.split_once(':')?;
            Some(Self::Basic { username: username.to_string(), password: password.to_string() })
        } else if scheme.eq_ignore_ascii_case("apikey") {
            Some(Self::ApiKey(credentials.to_string()))
        } else {
            Some(Self::Other { scheme: scheme.to_string(), credentials: credentials.to_string() })
        }
    }

    pub fn scheme(&self) -> &str {
        match self {
            Self::Bearer(_) => "Bearer",
            Self::Basic { .. } => "Basic",
            Self::ApiKey(_) => "ApiKey",
            Self::Other { scheme, .. } => scheme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer() {
        assert_eq!(Authorization::parse("Bearer abc.def"), Some(Authorization::Bearer("abc.def".into())));
        assert_eq!(Authorization::parse("bearer  xyz "), Some(Authorization::Bearer("xyz".into())));
    }

    #[test]
    fn test_basic() {
        // "aladdin:open sesame"
        let auth = Authorization::parse("Basic YWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert_eq!(auth, Some(Authorization::Basic { username: "aladdin".into(), password: "open sesame".into() }));

        assert_eq!(Authorization::parse("Basic not-base64!"), None);
    }

    #[test]
    fn test_api_key_and_other() {
        assert_eq!(Authorization::parse("ApiKey k-123"), Some(Authorization::ApiKey("k-123".into())));

        let other = Authorization::parse("Digest realm=x").unwrap();
        assert_eq!(other.scheme(), "Digest");
        assert_eq!(other, Authorization::Other { scheme: "Digest".into(), credentials: "realm=x".into() });
    }

    #[test]
    fn test_missing_credentials() {
        assert_eq!(Authorization::parse("Bearer"), None);
        assert_eq!(Authorization::parse(""), None);
    }
}
