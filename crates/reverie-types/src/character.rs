//! Character profile types.
//!
//! A character is a persisted persona the user converses with. Its free-text
//! facets are assembled into the "Character details" block of every prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who can see a character or lorebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("invalid visibility: '{other}'")),
        }
    }
}

/// Free-text persona facets of a character.
///
/// Each non-empty facet becomes one labeled line in the prompt's
/// "Character details" block, in the fixed order of the fields below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaFacets {
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub traits: String,
    #[serde(default)]
    pub speaking_style: String,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub knowledge: String,
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub greeting: String,
}

impl PersonaFacets {
    /// Labeled lines for every non-empty facet, in fixed label order.
    pub fn labeled_lines(&self) -> Vec<String> {
        let facets = [
            ("Persona", &self.persona),
            ("Scenario", &self.scenario),
            ("Traits", &self.traits),
            ("Speaking style", &self.speaking_style),
            ("Goals", &self.goals),
            ("Knowledge", &self.knowledge),
            ("Constraints", &self.constraints),
            ("Voice", &self.voice),
            ("Greeting", &self.greeting),
        ];
        facets
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("{label}: {value}"))
            .collect()
    }
}

/// A persisted character persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Behavioral guidelines appended to the system prompt.
    pub guidelines: String,
    /// Example dialogue appended after the guidelines.
    pub example_dialogue: String,
    pub facets: PersonaFacets,
    /// Lorebooks consulted when composing prompts for this character.
    pub lorebook_ids: Vec<Uuid>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
