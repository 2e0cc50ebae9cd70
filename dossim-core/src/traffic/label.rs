use std::{borrow::Borrow, fmt, sync::Arc};

/// The identity of a traffic component: `"victim"`, `"attacker"`, ...
///
/// Labels are compared by value and are cheap to clone, so they are used
/// directly as flow keys and as report keys.
///
/// ```
/// # use dossim_core::traffic::Label;
/// let victim = Label::from("victim");
/// let copy = victim.clone();
///
/// assert_eq!(victim, copy);
/// assert_eq!(victim, "victim");
/// assert_eq!(victim.to_string(), "victim");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(Arc<str>);

impl Label {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&Label> for Label {
    fn from(value: &Label) -> Self {
        value.clone()
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(Label::from("victim"), 1);
        map.insert(Label::from(String::from("scrubber")), 2);

        assert_eq!(map.get("victim"), Some(&1));
        assert_eq!(map.get("scrubber"), Some(&2));
        assert_eq!(map.get("attacker"), None);
    }

    #[test]
    fn ordered_by_value() {
        assert!(Label::from("attacker") < Label::from("victim"));
        assert_eq!(Label::from("OLAD").as_str(), "OLAD");
    }
}
