use std::collections::HashMap;

use crate::error::CoreError;

use super::{CATCH_ALL_PATH, RouteEntry, RouteError};

/// Redirect hops followed before resolution gives up.
pub const MAX_REDIRECTS: usize = 8;

/// Immutable set of routes, indexed by name and by path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    by_name: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

/// Outcome of resolving a location against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    /// Location after redirects.
    pub path: String,
    /// The entry that renders `path`.
    pub entry: &'a RouteEntry,
    /// Locations passed through on the way, in order.
    pub redirected_from: Vec<String>,
}

impl RouteTable {
    /// Entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn get_path(&self, path: &str) -> Option<&RouteEntry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    pub fn dynamic_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_dynamic()).count()
    }

    /// Resolve a location: exact path match, redirects followed, unknown
    /// paths through the catch-all entry.
    pub fn resolve(&self, location: &str) -> Result<Resolution<'_>, CoreError> {
        let mut current = normalize_path(location);
        let mut redirected_from = Vec::new();

        for _ in 0..=MAX_REDIRECTS {
            let entry = self
                .get_path(&current)
                .or_else(|| self.get_path(CATCH_ALL_PATH))
                .ok_or_else(|| CoreError::RouteNotFound {
                    path: current.clone(),
                })?;

            match &entry.redirect {
                None => {
                    return Ok(Resolution {
                        path: current,
                        entry,
                        redirected_from,
                    });
                }
                Some(target) => {
                    let next = normalize_path(target);
                    redirected_from.push(std::mem::replace(&mut current, next));
                }
            }
        }

        Err(RouteError::RedirectLoop { path: current }.into())
    }

    pub(super) fn insert(&mut self, entry: RouteEntry) -> Result<(), RouteError> {
        if self.by_name.contains_key(&entry.name) {
            return Err(RouteError::DuplicateName { name: entry.name });
        }
        if self.by_path.contains_key(&entry.path) {
            return Err(RouteError::DuplicatePath { path: entry.path });
        }
        let index = self.entries.len();
        self.by_name.insert(entry.name.clone(), index);
        self.by_path.insert(entry.path.clone(), index);
        self.entries.push(entry);
        Ok(())
    }
}

/// Leading slash, no query or fragment, no trailing slash except at root.
pub(crate) fn normalize_path(location: &str) -> String {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::routes::{RouteGuard, View};

    fn table(entries: Vec<RouteEntry>) -> RouteTable {
        let mut table = RouteTable::default();
        for entry in entries {
            table.insert(entry).unwrap();
        }
        table
    }

    #[test]
    fn normalizes_locations() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("dashboard/"), "/dashboard");
        assert_eq!(normalize_path("/groups/weather?tab=2#top"), "/groups/weather");
    }

    #[test]
    fn follows_redirects_and_catch_all() {
        let t = table(vec![
            RouteEntry::redirect("/", "root", "/dashboard"),
            RouteEntry::view("/dashboard", "dashboard", View::Dashboard, RouteGuard::PUBLIC),
            RouteEntry::redirect(CATCH_ALL_PATH, "not-found", "/"),
        ]);

        let res = t.resolve("/nowhere").unwrap();
        assert_eq!(res.path, "/dashboard");
        assert_eq!(res.entry.name, "dashboard");
        assert_eq!(res.redirected_from, ["/nowhere", "/"]);
    }

    #[test]
    fn missing_catch_all_is_not_found() {
        let t = table(vec![RouteEntry::view(
            "/login",
            "login",
            View::Login,
            RouteGuard::PUBLIC,
        )]);
        assert!(matches!(
            t.resolve("/elsewhere"),
            Err(CoreError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn redirect_cycles_are_bounded() {
        let t = table(vec![
            RouteEntry::redirect("/a", "a", "/b"),
            RouteEntry::redirect("/b", "b", "/a"),
        ]);
        assert!(matches!(
            t.resolve("/a"),
            Err(CoreError::Route(RouteError::RedirectLoop { .. }))
        ));
    }
}
