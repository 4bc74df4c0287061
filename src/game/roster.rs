//! Player membership and roles of one game

use std::collections::BTreeMap;

/// Role of a roster member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Still in the running; can be eliminated or win
    Competitor,
    /// Eliminated, joined mid-match, or waiting in the lobby
    Spectator,
}

/// All players of a game, each tagged with exactly one role.
///
/// Keeping the role on the entry makes `competitors ∪ spectators == all`
/// hold by construction. Iteration is ordered by name.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: BTreeMap<String, Role>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new player as spectator. Returns false if the name is taken.
    pub fn add(&mut self, name: &str) -> bool {
        if self.players.contains_key(name) {
            return false;
        }
        self.players.insert(name.to_string(), Role::Spectator);
        true
    }

    /// Remove a player. Returns false if the name is unknown.
    pub fn remove(&mut self, name: &str) -> bool {
        self.players.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        self.players.get(name).copied()
    }

    pub fn is_competitor(&self, name: &str) -> bool {
        self.role(name) == Some(Role::Competitor)
    }

    pub fn is_spectator(&self, name: &str) -> bool {
        self.role(name) == Some(Role::Spectator)
    }

    /// Move a competitor to the spectators. Returns false if the player
    /// was not competing.
    pub fn eliminate(&mut self, name: &str) -> bool {
        match self.players.get_mut(name) {
            Some(role) if *role == Role::Competitor => {
                *role = Role::Spectator;
                true
            }
            _ => false,
        }
    }

    /// Tag every member with `role`
    pub fn assign_all(&mut self, role: Role) {
        for tag in self.players.values_mut() {
            *tag = role;
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, Role)> {
        self.players.iter().map(|(name, role)| (name.as_str(), *role))
    }

    pub fn competitors(&self) -> impl Iterator<Item = &str> {
        self.with_role(Role::Competitor)
    }

    pub fn spectators(&self) -> impl Iterator<Item = &str> {
        self.with_role(Role::Spectator)
    }

    fn with_role(&self, role: Role) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .filter(move |(_, tag)| **tag == role)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn competitor_count(&self) -> usize {
        self.competitors().count()
    }

    /// The only remaining competitor, if exactly one is left
    pub fn sole_competitor(&self) -> Option<&str> {
        let mut competitors = self.competitors();
        match (competitors.next(), competitors.next()) {
            (Some(name), None) => Some(name),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
