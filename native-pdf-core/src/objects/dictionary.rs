use super::reference::{references_in, ObjectId};
use indexmap::IndexMap;

/// Insertion-ordered map of name keys to raw value text.
///
/// Keys are stored without the leading `/`. Values are kept exactly as they
/// appear in the file (`/Catalog`, `2 0 R`, `[0 0 612 792]`, `<< ... >>`) and
/// are only interpreted on demand through the typed getters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: IndexMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Set `key` to `value`. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = key.strip_prefix('/').map(str::to_string).unwrap_or(key);
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.entries.get_mut(key)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.entries.values_mut()
    }

    /// Name value without its leading slash (`/Page` -> `Page`).
    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key)
            .map(str::trim)
            .and_then(|value| value.strip_prefix('/'))
    }

    pub fn get_reference(&self, key: &str) -> Option<ObjectId> {
        self.get(key).and_then(ObjectId::parse_reference)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }

    /// Every reference inside an array value such as `/Kids [3 0 R 5 0 R]`.
    pub fn get_references(&self, key: &str) -> Vec<ObjectId> {
        self.get(key).map(references_in).unwrap_or_default()
    }

    /// Numbers inside an array value such as `/MediaBox [0 0 612 792]`.
    pub fn get_numbers(&self, key: &str) -> Option<Vec<f64>> {
        parse_numbers(self.get(key)?)
    }

    /// Serialize as `<< /Key Value ... >>`.
    pub fn to_pdf_string(&self) -> String {
        let mut out = String::from("<<");
        for (key, value) in &self.entries {
            out.push_str(" /");
            out.push_str(key);
            let value = value.trim();
            if !value.is_empty() {
                out.push(' ');
                out.push_str(value);
            }
        }
        out.push_str(" >>");
        out
    }
}

impl FromIterator<(String, String)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

/// Numbers of an array value such as `[0 0 612 792]`.
pub fn parse_numbers(value: &str) -> Option<Vec<f64>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    inner
        .split_whitespace()
        .map(|token| token.parse::<f64>().ok())
        .collect()
}
