use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SalesRep,
    PricingAnalyst,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalesRep => "sales_rep",
            Self::PricingAnalyst => "pricing_analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant in the pricing workflow. Actors are selected, not
/// authenticated: whoever drives an operation asserts which actor they are.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
    pub role: Role,
    pub initials: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        let display_name = display_name.into();
        let initials = initials_for(&display_name);
        Self { id: ActorId::new(id), display_name, role, initials }
    }

    pub fn is_sales_rep(&self) -> bool {
        self.role == Role::SalesRep
    }

    pub fn is_pricing_analyst(&self) -> bool {
        self.role == Role::PricingAnalyst
    }
}

fn initials_for(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// Roster of every actor known to a workspace.
#[derive(Clone, Debug, Default)]
pub struct ActorDirectory {
    actors: Vec<Actor>,
}

impl ActorDirectory {
    pub fn new(actors: Vec<Actor>) -> Self {
        let mut directory = Self::default();
        for actor in actors {
            directory.register(actor);
        }
        directory
    }

    /// Adds an actor, replacing any previous entry with the same id.
    pub fn register(&mut self, actor: Actor) {
        match self.actors.iter_mut().find(|existing| existing.id == actor.id) {
            Some(existing) => *existing = actor,
            None => self.actors.push(actor),
        }
    }

    pub fn get(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| &actor.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id.as_str() == id)
    }

    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(move |actor| actor.role == role)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
