use std::collections::HashMap;

use crate::models::ResourceKind;

/// Route key some callers use for the project key instead of its tag.
pub const PROJECT_KEY_FALLBACK: &str = "key";

/// Route variables extracted by the caller from the inbound request.
///
/// Variables that are not resource tags are kept so evaluators can read
/// companion values (such as the project key next to a workflow name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRefs {
    vars: HashMap<String, String>,
}

impl ResourceRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn with(mut self, kind: ResourceKind, id: impl Into<String>) -> Self {
        self.vars.insert(kind.tag().to_string(), id.into());
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        self.var(kind.tag())
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Present resource kinds, in evaluation order.
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.vars.contains_key(kind.tag()))
    }

    pub fn project_key(&self) -> Option<&str> {
        self.get(ResourceKind::Project)
            .or_else(|| self.var(PROJECT_KEY_FALLBACK))
            .filter(|key| !key.is_empty())
    }

    pub fn group_name(&self) -> Option<&str> {
        self.get(ResourceKind::Group).filter(|name| !name.is_empty())
    }
}

impl FromIterator<(String, String)> for ResourceRefs {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
