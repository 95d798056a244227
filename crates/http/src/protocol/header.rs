//! Ordered header storage shared by requests and responses.
//!
//! Names keep the case they were received or inserted with, lookups ignore
//! ASCII case. Inserting a name that already exists replaces its value in
//! place, so output order is always first-insertion order.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Inserts a header, returning the previous value if the name was present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.entries.remove(index).1)
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
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("User-Agent", "curl/7.79.1");
        headers.insert("X-Request-Id", "abc");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("User-Agent"), Some("curl/7.79.1"));
        assert_eq!(headers.get("user-agent"), Some("curl/7.79.1"));
        assert_eq!(headers.get("Encoding"), None);
    }

    #[test]
    fn test_replace_keeps_position_and_case() {
        let mut headers = Headers::new();
        headers.insert("X-First", "1");
        headers.insert("X-Second", "2");

        let old = headers.insert("x-first", "3");

        assert_eq!(old.as_deref(), Some("1"));
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("X-First", "3"), ("X-Second", "2")]);
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(headers.remove("a").as_deref(), Some("1"));
        assert!(!headers.contains("A"));
        assert_eq!(headers.len(), 1);
    }
}
