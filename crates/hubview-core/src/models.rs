//! GitHub user and repository records.
//!
//! Field names match the REST API's snake_case payloads one to one. The same
//! names are used when pages are written to the cache, so cached bytes decode
//! with the same mapping as network responses.

use serde::{Deserialize, Serialize};

/// A GitHub account.
///
/// `name`, `followers` and `following` are only present on the single-user
/// endpoint; list responses leave them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub avatar_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub followers: Option<u32>,
    #[serde(default)]
    pub following: Option<u32>,
}

impl User {
    /// Name to show for this user, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.login)
    }
}

/// A repository owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub stargazers_count: u32,
    pub html_url: String,
    pub fork: bool,
}
