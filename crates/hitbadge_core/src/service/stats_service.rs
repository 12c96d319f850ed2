//! Read-side aggregate views over the counter store.
//!
//! # Responsibility
//! - Build per-repo, per-user and global views from store reads.
//!
//! # Invariants
//! - Never writes; only the store's read path is used.
//! - Users appear in ascending order, and each user's repos ascending.
//! - A user with no counters yields an empty view, not an error.

use crate::model::counter::{RepoCount, UserRepoCount};
use crate::repo::counter_repo::StoreResult;
use crate::store::CounterStore;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Counters for one user, repos ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user: String,
    pub repos: Vec<RepoCount>,
}

/// JSON shape of the stats endpoints:
/// `{ "<user>": { "<repo>": <count>, ... }, ... }`.
///
/// Keys are written in the order the groups hold them, so store ordering
/// survives serialization without an order-preserving map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsDocument {
    groups: Vec<UserStats>,
}

impl StatsDocument {
    pub fn new(groups: Vec<UserStats>) -> Self {
        Self { groups }
    }
}

impl From<UserStats> for StatsDocument {
    fn from(value: UserStats) -> Self {
        Self::new(vec![value])
    }
}

impl Serialize for StatsDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.user, &RepoMap(&group.repos))?;
        }
        map.end()
    }
}

struct RepoMap<'a>(&'a [RepoCount]);

impl Serialize for RepoMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for row in self.0 {
            map.serialize_entry(&row.repo, &row.count)?;
        }
        map.end()
    }
}

/// Query service for the stats endpoints.
#[derive(Debug, Clone)]
pub struct StatsService {
    store: CounterStore,
}

impl StatsService {
    pub fn new(store: CounterStore) -> Self {
        Self { store }
    }

    /// Single-counter view. An unseen key reports a count of 0.
    pub fn repo_stats(&self, user: &str, repo: &str) -> StoreResult<UserStats> {
        let count = self.store.get(user, repo)?;
        Ok(UserStats {
            user: user.to_string(),
            repos: vec![RepoCount {
                repo: repo.to_string(),
                count,
            }],
        })
    }

    /// All of one user's counters.
    pub fn user_stats(&self, user: &str) -> StoreResult<UserStats> {
        let repos = self.store.list_repo_counts(user)?;
        Ok(UserStats {
            user: user.to_string(),
            repos,
        })
    }

    /// Every counter in the store, grouped by user.
    pub fn all_stats(&self) -> StoreResult<Vec<UserStats>> {
        Ok(group_by_user(self.store.list_all_counts()?))
    }
}

/// Groups rows already sorted by `(user, repo)` into one entry per user.
///
/// Input order is preserved, so sorted input gives sorted groups.
pub fn group_by_user(rows: impl IntoIterator<Item = UserRepoCount>) -> Vec<UserStats> {
    let mut groups: Vec<UserStats> = Vec::new();
    for row in rows {
        let entry = RepoCount {
            repo: row.repo,
            count: row.count,
        };
        if let Some(group) = groups.last_mut().filter(|group| group.user == row.user) {
            group.repos.push(entry);
            continue;
        }
        groups.push(UserStats {
            user: row.user,
            repos: vec![entry],
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{group_by_user, StatsDocument, UserStats};
    use crate::model::counter::{RepoCount, UserRepoCount};

    fn row(user: &str, repo: &str, count: u64) -> UserRepoCount {
        UserRepoCount {
            user: user.to_string(),
            repo: repo.to_string(),
            count,
        }
    }

    #[test]
    fn group_by_user_splits_on_user_change() {
        let groups = group_by_user(vec![
            row("alice", "a", 1),
            row("alice", "b", 2),
            row("bob", "a", 3),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].user, "alice");
        assert_eq!(groups[0].repos.len(), 2);
        assert_eq!(groups[1].user, "bob");
        assert_eq!(groups[1].repos[0].count, 3);
    }

    #[test]
    fn group_by_user_of_nothing_is_empty() {
        assert!(group_by_user(Vec::new()).is_empty());
    }

    #[test]
    fn document_nests_repos_under_users_in_order() {
        let document = StatsDocument::new(group_by_user(vec![
            row("bob", "zeta", 1),
            row("bob", "alpha", 2),
            row("alice", "mid", 3),
        ]));

        let json = serde_json::to_string(&document).unwrap();
        assert_eq!(json, r#"{"bob":{"zeta":1,"alpha":2},"alice":{"mid":3}}"#);
    }

    #[test]
    fn document_for_user_without_repos_has_empty_object() {
        let document = StatsDocument::from(UserStats {
            user: "nobody".to_string(),
            repos: Vec::<RepoCount>::new(),
        });

        assert_eq!(serde_json::to_string(&document).unwrap(), r#"{"nobody":{}}"#);
        assert_eq!(
            serde_json::to_string(&StatsDocument::new(Vec::new())).unwrap(),
            "{}"
        );
    }
}
