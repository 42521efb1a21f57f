use std::collections::HashSet;

/// The set of permissions granted by a token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    granted: HashSet<String>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `permission` is granted
    pub fn contains(&self, permission: &str) -> bool {
        self.granted.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A predicate over [`Permissions`]
///
/// Assertions compose: leaves check permission names, `Or` and `And` combine
/// other assertions.
///
/// # Example
///
/// ```rust
/// use satchel::{Assertion, Permissions};
///
/// let can_edit = Assertion::or([
///     Assertion::has_any(["admin"]),
///     Assertion::has_all(["posts:read", "posts:write"]),
/// ]);
///
/// let editor: Permissions = ["posts:read", "posts:write"].into_iter().collect();
/// let reader: Permissions = ["posts:read"].into_iter().collect();
/// assert!(can_edit.check(&editor));
/// assert!(!can_edit.check(&reader));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// At least one of the listed permissions is granted
    HasAny(Vec<String>),
    /// Every listed permission is granted
    HasAll(Vec<String>),
    /// At least one nested assertion holds
    Or(Vec<Assertion>),
    /// Every nested assertion holds
    And(Vec<Assertion>),
}

impl Assertion {
    /// Holds when any of `permissions` is granted; never holds for an empty list
    pub fn has_any<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::HasAny(permissions.into_iter().map(Into::into).collect())
    }

    /// Holds when all of `permissions` are granted; always holds for an empty list
    pub fn has_all<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::HasAll(permissions.into_iter().map(Into::into).collect())
    }

    /// Holds when any of `assertions` holds; never holds for an empty list
    pub fn or(assertions: impl IntoIterator<Item = Assertion>) -> Self {
        Self::Or(assertions.into_iter().collect())
    }

    /// Holds when all of `assertions` hold; always holds for an empty list
    pub fn and(assertions: impl IntoIterator<Item = Assertion>) -> Self {
        Self::And(assertions.into_iter().collect())
    }

    /// Evaluate the assertion against granted permissions
    pub fn check(&self, permissions: &Permissions) -> bool {
        match self {
            Self::HasAny(required) => required.iter().any(|p| permissions.contains(p)),
            Self::HasAll(required) => required.iter().all(|p| permissions.contains(p)),
            Self::Or(assertions) => assertions.iter().any(|a| a.check(permissions)),
            Self::And(assertions) => assertions.iter().all(|a| a.check(permissions)),
        }
    }
}
