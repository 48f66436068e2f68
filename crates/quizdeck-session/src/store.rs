//! Scenario and card data.
//!
//! Both collections are read-only after loading. Scenarios feed the deck
//! builder; cards are looked up by id when a turn is rendered.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QuizError, Result};

/// One card slot inside a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Slot identifier, unique within its scenario.
    pub slot_id: String,
    /// What the card in this slot is meant to depict (e.g. "graph").
    pub category: String,
    /// The card shown for this slot.
    pub card_id: String,
    /// Whether the card truthfully represents the scenario.
    pub is_correct: bool,
}

/// A physical situation the player judges cards against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier.
    pub id: String,
    /// Text shown above every card of this scenario.
    pub description: String,
    /// Slots in presentation order.
    #[serde(default)]
    pub slots: Vec<Slot>,
}

/// What a card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardContent {
    /// A text statement.
    Text {
        /// The statement.
        #[serde(default)]
        text: String,
    },
    /// An image, referenced by an opaque asset path.
    Image {
        /// Asset reference, resolved by the presentation layer.
        #[serde(default)]
        asset: String,
    },
}

/// A card the player judges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card identifier.
    pub id: String,
    /// Text or image payload.
    #[serde(flatten)]
    pub content: CardContent,
}

impl Card {
    /// Creates a text card.
    #[must_use]
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: CardContent::Text { text: text.into() },
        }
    }

    /// Creates an image card.
    #[must_use]
    pub fn image(id: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: CardContent::Image {
                asset: asset.into(),
            },
        }
    }

    /// Returns `true` for image cards.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self.content, CardContent::Image { .. })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Default, Deserialize)]
struct CardFile {
    #[serde(default)]
    cards: Vec<Card>,
}

/// Read-only scenario and card collections.
#[derive(Debug, Clone, Default)]
pub struct QuizStore {
    scenarios: Vec<Scenario>,
    cards: Vec<Card>,
    card_index: HashMap<String, usize>,
}

impl QuizStore {
    /// Builds a store from in-memory collections.
    ///
    /// When card ids repeat, the first card with that id wins.
    #[must_use]
    pub fn new(scenarios: Vec<Scenario>, cards: Vec<Card>) -> Self {
        let mut card_index = HashMap::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            card_index.entry(card.id.clone()).or_insert(idx);
        }
        Self {
            scenarios,
            cards,
            card_index,
        }
    }

    /// Loads scenarios and cards from two JSON files.
    ///
    /// A file without a `scenarios` (or `cards`) key yields an empty
    /// collection rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DataNotFound` when a file is missing and
    /// `QuizError::DataParseError` when it is not valid JSON.
    pub fn load(scenarios_path: &Path, cards_path: &Path) -> Result<Self> {
        let scenario_file: ScenarioFile = read_json(scenarios_path)?;
        let card_file: CardFile = read_json(cards_path)?;

        debug!(
            scenarios = scenario_file.scenarios.len(),
            cards = card_file.cards.len(),
            "Loaded quiz data"
        );

        Ok(Self::new(scenario_file.scenarios, card_file.cards))
    }

    /// All scenarios in input order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// All cards in input order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of scenarios.
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Looks up a card by id.
    ///
    /// A miss is logged and returned as `None`; callers render a degraded card.
    #[must_use]
    pub fn card(&self, id: &str) -> Option<&Card> {
        let card = self.card_index.get(id).and_then(|&idx| self.cards.get(idx));
        if card.is_none() {
            warn!(card_id = %id, "Card not found in store");
        }
        card
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QuizError::data_not_found(path));
        }
        Err(e) => {
            return Err(QuizError::data_parse(
                path,
                format!("failed to read file: {e}"),
            ));
        }
    };

    serde_json::from_str(&contents).map_err(|e| QuizError::data_parse(path, e.to_string()))
}
