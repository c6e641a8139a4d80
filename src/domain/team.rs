// Team and user domain models
use super::issue::UserId;
use serde::Deserialize;
use std::collections::HashMap;

pub type TeamId = u32;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// Lookup of display names by user id.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    names: HashMap<UserId, String>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            names: users.into_iter().map(|u| (u.id, u.name)).collect(),
        }
    }

    pub fn display_name(&self, id: UserId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("user {}", id))
    }
}
