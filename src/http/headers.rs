//! Ordered header collection.
//!
//! # Design Decisions
//! - Insertion order is preserved (diagnostics and cURL output are stable)
//! - Name lookup is ASCII case-insensitive; the first spelling seen is kept
//! - Multi-valued headers are stored as repeated entries

use std::fmt;

/// Ordered, case-insensitive, possibly multi-valued header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `name` with `value`, keeping the position of the first entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(idx) => {
                self.entries[idx].1 = value;
                let mut seen = 0usize;
                self.entries.retain(|(k, _)| {
                    if k.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Set `name` only if it is not already present.
    pub fn set_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push((name, value.into()));
        }
    }

    /// Add another value for `name` without touching existing ones.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every value of `name`; returns true if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before != self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Distinct names with their values grouped, in first-seen order.
    pub fn grouped(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for (k, v) in &self.entries {
            match groups.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(k)) {
                Some((_, values)) => values.push(v.as_str()),
                None => groups.push((k.as_str(), vec![v.as_str()])),
            }
        }
        groups
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, values) in self.grouped() {
            writeln!(f, "{} : {}", name, values.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_set_replaces_all_values_in_place() {
        let mut headers = Headers::new();
        headers.append("A", "1");
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        headers.set("SET-COOKIE", "c=3");

        let all: Vec<_> = headers.iter().collect();
        assert_eq!(all, vec![("A", "1"), ("Set-Cookie", "c=3")]);
    }

    #[test]
    fn test_set_if_absent_keeps_existing() {
        let mut headers = Headers::new();
        headers.set("User-Agent", "custom");
        headers.set_if_absent("user-agent", "fuel");
        headers.set_if_absent("Accept", "*/*");
        assert_eq!(headers.get("User-Agent"), Some("custom"));
        assert_eq!(headers.get("Accept"), Some("*/*"));
    }

    #[test]
    fn test_grouped_preserves_multi_values() {
        let headers: Headers = vec![("Via", "a"), ("X", "1"), ("via", "b")].into_iter().collect();
        let grouped = headers.grouped();
        assert_eq!(grouped[0], ("Via", vec!["a", "b"]));
        assert_eq!(grouped[1], ("X", vec!["1"]));
        assert_eq!(headers.get_all("VIA").count(), 2);
    }

    #[test]
    fn test_remove() {
        let mut headers: Headers = vec![("Authorization", "Basic x")].into_iter().collect();
        assert!(headers.remove("authorization"));
        assert!(!headers.remove("authorization"));
        assert!(headers.is_empty());
    }
}
