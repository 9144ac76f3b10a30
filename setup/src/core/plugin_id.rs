//! Plugin identifier canonicalization.

use std::fmt;
use std::str::FromStr;

use crate::error::SetupError;

/// Namespace every managed plugin lives under.
pub const NAMESPACE: &str = "molcajete";

/// Canonical `<namespace>/<name>` plugin identifier.
///
/// Short names (`git`), already-namespaced names (`molcajete/git`) and casing
/// or whitespace variants (` Git `) all normalize to the same value, so two
/// spellings of one plugin never produce two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    pub fn parse(raw: &str) -> Result<Self, SetupError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let name = match normalized.split_once('/') {
            Some((namespace, rest)) if namespace == NAMESPACE => rest,
            _ => normalized.as_str(),
        };
        if name.trim().is_empty() {
            return Err(SetupError::InvalidIdentifier {
                raw: raw.to_string(),
            });
        }
        Ok(Self(format!("{NAMESPACE}/{name}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if `key`, as found in a settings file, names this plugin.
    ///
    /// Only namespaced keys match: `Molcajete/Git ` matches `molcajete/git`,
    /// but a bare `git` or a foreign `other/git` key does not.
    pub fn matches_key(&self, key: &str) -> bool {
        key.trim().eq_ignore_ascii_case(&self.0)
    }

    /// Name without the namespace prefix.
    pub fn name(&self) -> &str {
        &self.0[NAMESPACE.len() + 1..]
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PluginId {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Deduplicated set of requested plugins, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSelection {
    ids: Vec<PluginId>,
}

impl PluginSelection {
    /// Canonicalize every raw identifier. Fails on the first invalid one.
    pub fn parse<I, S>(raw: I) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for item in raw {
            selection.insert(PluginId::parse(item.as_ref())?);
        }
        Ok(selection)
    }

    /// Add `id` unless an equal identifier is already selected.
    pub fn insert(&mut self, id: PluginId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginId> {
        self.ids.iter()
    }
}

impl FromIterator<PluginId> for PluginSelection {
    fn from_iter<T: IntoIterator<Item = PluginId>>(iter: T) -> Self {
        let mut selection = Self::default();
        for id in iter {
            selection.insert(id);
        }
        selection
    }
}

impl<'a> IntoIterator for &'a PluginSelection {
    type Item = &'a PluginId;
    type IntoIter = std::slice::Iter<'a, PluginId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_gets_namespace() {
        let id = PluginId::parse("git").expect("parse");
        assert_eq!(id.as_str(), "molcajete/git");
        assert_eq!(id.name(), "git");
    }

    #[test]
    fn already_canonical_is_not_prefixed_twice() {
        let id = PluginId::parse("molcajete/res").expect("parse");
        assert_eq!(id.as_str(), "molcajete/res");
    }

    #[test]
    fn casing_and_whitespace_variants_collapse() {
        let a = PluginId::parse("  Git ").expect("parse");
        let b = PluginId::parse("MOLCAJETE/git").expect("parse");
        assert_eq!(a, b);
    }

    #[test]
    fn foreign_namespace_is_treated_as_a_name() {
        let id = PluginId::parse("other/tool").expect("parse");
        assert_eq!(id.as_str(), "molcajete/other/tool");
    }

    #[test]
    fn empty_names_are_rejected() {
        for raw in ["", "   ", "molcajete/", "molcajete/  "] {
            let err = PluginId::parse(raw).unwrap_err();
            assert!(
                matches!(err, SetupError::InvalidIdentifier { .. }),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn matches_only_namespaced_spellings() {
        let id = PluginId::parse("git").expect("parse");
        assert!(id.matches_key("molcajete/git"));
        assert!(id.matches_key(" Molcajete/GIT "));
        assert!(!id.matches_key("git"));
        assert!(!id.matches_key("other/git"));
        assert!(!id.matches_key("molcajete/gitx"));
    }

    #[test]
    fn selection_dedupes_in_first_seen_order() {
        let selection =
            PluginSelection::parse(["res", "git", "Res", "molcajete/git"]).expect("parse");
        let ids: Vec<&str> = selection.iter().map(PluginId::as_str).collect();
        assert_eq!(ids, vec!["molcajete/res", "molcajete/git"]);
    }
}
