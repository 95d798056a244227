//! Query string and path parameter storage.

use std::borrow::Cow;

/// An ordered string map where a repeated key overwrites the earlier value
/// but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string (without the leading `?`).
    ///
    /// Pieces are split on `&`, then on the first `=`. A piece without `=` is
    /// ignored. Values are percent-decoded, `+` is left as is.
    pub fn parse_query(query: &str) -> Self {
        let mut params = Params::new();
        for piece in query.split('&') {
            let Some((key, value)) = piece.split_once('=') else {
                continue;
            };
            params.insert(key, percent_decode(value));
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// invalid escapes leave the raw value untouched
fn percent_decode(value: &str) -> String {
    urlencoding::decode(value).map_or_else(|_| value.to_string(), Cow::into_owned)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let params = Params::parse_query("name=tom&age=3&city=new%20york");

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("name"), Some("tom"));
        assert_eq!(params.get("age"), Some("3"));
        assert_eq!(params.get("city"), Some("new york"));
    }

    #[test]
    fn test_parse_query_skips_pieces_without_equal() {
        let params = Params::parse_query("flag&a=1&&b=");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("flag"), None);
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some(""));
    }

    #[test]
    fn test_parse_query_last_wins() {
        let params = Params::parse_query("a=1&b=2&a=3");

        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_parse_query_first_equal_only() {
        let params = Params::parse_query("expr=a=b&plus=a+b");

        assert_eq!(params.get("expr"), Some("a=b"));
        assert_eq!(params.get("plus"), Some("a+b"));
    }
}
