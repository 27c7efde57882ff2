use std::borrow::Cow;
use std::collections::HashMap;

use serde::Serialize;

use super::{character_rows, CharacterRow, RawTable};

const DEAD_KEYWORD: &str = "dead";
const PLAYER_KEYWORD: &str = "player";

/// Normalize a display name or reference into a registry lookup key.
///
/// Every lookup site goes through here, both when the registry is built and
/// when relations are resolved against it.
pub fn person_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A character of the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    pub description: String,
    pub race: String,
    pub alive: bool,
    pub is_player: bool,
    pub locations: Vec<String>,
    pub appeared: String,
}

impl Person {
    /// A person known only by name. Used for references to characters
    /// missing from the character sheet.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            race: String::new(),
            alive: true,
            is_player: false,
            locations: Vec::new(),
            appeared: String::new(),
        }
    }

    pub fn from_row(row: CharacterRow) -> Self {
        let keywords: Vec<String> = row
            .keywords
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let locations = row
            .locations
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            alive: !keywords.iter().any(|k| k == DEAD_KEYWORD),
            is_player: keywords.iter().any(|k| k == PLAYER_KEYWORD),
            name: row.name,
            description: row.description,
            race: row.race,
            locations,
            appeared: row.appeared,
        }
    }

    pub fn key(&self) -> String {
        person_key(&self.name)
    }
}

/// All persons of the campaign, addressable by lookup key.
///
/// Persons are kept in sheet order. A later row whose name normalizes to an
/// existing key replaces the earlier person in place.
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    persons: Vec<Person>,
    index: HashMap<String, usize>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = CharacterRow>) -> Self {
        let mut registry = Self::new();
        for row in rows {
            registry.insert(Person::from_row(row));
        }
        registry
    }

    /// Build from a raw character sheet, skipping rows without a name.
    pub fn from_table(table: &RawTable) -> Self {
        Self::from_rows(character_rows(table))
    }

    pub fn insert(&mut self, person: Person) {
        let key = person.key();
        match self.index.get(&key) {
            Some(&slot) => {
                tracing::debug!("Duplicate character {:?}, keeping the later row", key);
                self.persons[slot] = person;
            }
            None => {
                self.index.insert(key, self.persons.len());
                self.persons.push(person);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Person> {
        self.index
            .get(&person_key(key))
            .map(|&slot| &self.persons[slot])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&person_key(key))
    }

    /// Look up a person, falling back to a placeholder named after `key`.
    pub fn resolve(&self, key: &str) -> Cow<'_, Person> {
        match self.get(key) {
            Some(person) => Cow::Borrowed(person),
            None => {
                tracing::warn!("Don't have a record about {:?}", key);
                Cow::Owned(Person::placeholder(key))
            }
        }
    }

    /// Persons in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
