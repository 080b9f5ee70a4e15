use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod columns;
pub mod derive;

pub use columns::*;
pub use derive::*;

/// Grading periods every record is expected to carry, in store key order.
pub const PERIOD_KEYS: [&str; 6] = [
    "w0102", "w0304", "week0506", "week0708", "week0910", "week1112",
];

/// Stack categories offered by the Stack column filter.
pub const KNOWN_STACKS: [&str; 5] = ["MERN", "SERVERLESS", "LAMP", "DJANGO", "MEAN"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profiles: Profiles,
    #[serde(default)]
    pub stack: String,
    pub batch: i64,
    #[serde(default)]
    pub grades: Grades,
    #[serde(default)]
    pub certificates: Certificates,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profiles {
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub codepen: String,
    #[serde(default)]
    pub codewars: String,
}

/// Score per grading period. Keys iterate in lexicographic order, which is
/// also the order the store returns them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grades(BTreeMap<String, i64>);

impl Grades {
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(key, score)| (key.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, period: &str) -> Option<i64> {
        self.0.get(period).copied()
    }

    /// Whether the key set is exactly [`PERIOD_KEYS`].
    pub fn has_standard_periods(&self) -> bool {
        self.0.len() == PERIOD_KEYS.len() && PERIOD_KEYS.iter().all(|key| self.0.contains_key(*key))
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for Grades {
    fn from_iter<T: IntoIterator<Item = (K, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(key, score)| (key.into(), score)).collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificates {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub scrum: Option<String>,
    #[serde(default, rename = "cyberSecurity")]
    pub cyber_security: Option<String>,
}

impl Certificates {
    pub fn english(&self) -> Option<&str> {
        completed(self.english.as_deref())
    }

    pub fn scrum(&self) -> Option<&str> {
        completed(self.scrum.as_deref())
    }

    pub fn cyber_security(&self) -> Option<&str> {
        completed(self.cyber_security.as_deref())
    }
}

// An empty string on the wire means the certificate was never earned.
fn completed(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
