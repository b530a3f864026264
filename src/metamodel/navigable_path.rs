use std::fmt;
use std::sync::Arc;

/// Location of an attribute inside a query's result/fetch tree.
///
/// Paths are cheap to clone; `append` shares the parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigablePath {
    parent: Option<Arc<NavigablePath>>,
    local_name: String,
    full_path: String,
}

impl NavigablePath {
    pub fn new(root: impl Into<String>) -> Self {
        let local_name = root.into();
        Self {
            parent: None,
            full_path: local_name.clone(),
            local_name,
        }
    }

    pub fn append(&self, name: &str) -> Self {
        Self {
            parent: Some(Arc::new(self.clone())),
            local_name: name.to_string(),
            full_path: format!("{}.{}", self.full_path, name),
        }
    }

    pub fn parent(&self) -> Option<&NavigablePath> {
        self.parent.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }
}

impl fmt::Display for NavigablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_builds_full_path() {
        let root = NavigablePath::new("Customer");
        let prefs = root.append("preferences");
        let key = prefs.append("{index}");

        assert_eq!(key.full_path(), "Customer.preferences.{index}");
        assert_eq!(key.local_name(), "{index}");
        assert_eq!(key.parent().unwrap(), &prefs);
        assert!(root.parent().is_none());
    }
}
