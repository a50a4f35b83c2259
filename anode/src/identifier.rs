use std::fmt;

/// Identifies a container entry.
///
/// An entry is either a single type name or an ordered intersection of type
/// names, which is satisfied only by a resolver registered for exactly that
/// sequence of members.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntryIdentifier {
    Single(String),
    Intersection(Vec<String>),
}

impl EntryIdentifier {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(id) => id.is_empty(),
            Self::Intersection(members) => members.is_empty(),
        }
    }
}

impl fmt::Display for EntryIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(id) => f.write_str(id),
            Self::Intersection(members) => f.write_str(&members.join("&")),
        }
    }
}

impl From<&str> for EntryIdentifier {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<String> for EntryIdentifier {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&String> for EntryIdentifier {
    fn from(value: &String) -> Self {
        Self::Single(value.clone())
    }
}

impl From<Vec<String>> for EntryIdentifier {
    fn from(value: Vec<String>) -> Self {
        Self::Intersection(value)
    }
}

impl From<Vec<&str>> for EntryIdentifier {
    fn from(value: Vec<&str>) -> Self {
        Self::Intersection(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for EntryIdentifier {
    fn from(value: &[&str]) -> Self {
        Self::Intersection(value.iter().map(|v| (*v).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EntryIdentifier {
    fn from(value: [&str; N]) -> Self {
        Self::Intersection(value.iter().map(|v| (*v).to_owned()).collect())
    }
}
