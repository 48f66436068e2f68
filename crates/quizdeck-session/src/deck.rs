//! Deck construction.
//!
//! A deck is the flat, ordered sequence of turns for one session: every slot
//! of every scenario, in scenario order and then slot order. Entries are
//! denormalized so the deck does not borrow from the store once built.

use serde::{Deserialize, Serialize};

use crate::store::Scenario;

/// One playable turn: a scenario paired with one of its slot cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckEntry {
    /// Originating scenario id.
    pub scenario_id: String,
    /// Originating scenario description.
    pub scenario_description: String,
    /// 0-based position of the scenario in the input.
    pub scenario_index: usize,
    /// Originating slot id.
    pub slot_id: String,
    /// Slot category.
    pub category: String,
    /// Card to show for this turn.
    pub card_id: String,
    /// Ground truth, copied verbatim from the slot.
    pub is_correct: bool,
}

/// Ordered, immutable sequence of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    entries: Vec<DeckEntry>,
    scenario_count: usize,
}

impl Deck {
    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no turns to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The turn at `position`, if any.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&DeckEntry> {
        self.entries.get(position)
    }

    /// Iterates over turns in play order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeckEntry> {
        self.entries.iter()
    }

    /// Number of scenarios the deck was built from.
    #[must_use]
    pub const fn scenario_count(&self) -> usize {
        self.scenario_count
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a DeckEntry;
    type IntoIter = std::slice::Iter<'a, DeckEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Flattens scenarios into a deck.
///
/// No reordering, deduplication or filtering. An empty result means the
/// data is not ready; callers must not start a session with it.
///
/// # Examples
///
/// ```
/// use quizdeck_session::{build_deck, Scenario, Slot};
///
/// let scenarios = vec![Scenario {
///     id: "s1".to_string(),
///     description: "A cart rolls down a ramp".to_string(),
///     slots: vec![Slot {
///         slot_id: "a".to_string(),
///         category: "graph".to_string(),
///         card_id: "c1".to_string(),
///         is_correct: true,
///     }],
/// }];
///
/// let deck = build_deck(&scenarios);
/// assert_eq!(deck.len(), 1);
/// assert_eq!(deck.get(0).map(|e| e.card_id.as_str()), Some("c1"));
/// ```
#[must_use]
pub fn build_deck(scenarios: &[Scenario]) -> Deck {
    let entries = scenarios
        .iter()
        .enumerate()
        .flat_map(|(scenario_index, scenario)| {
            scenario.slots.iter().map(move |slot| DeckEntry {
                scenario_id: scenario.id.clone(),
                scenario_description: scenario.description.clone(),
                scenario_index,
                slot_id: slot.slot_id.clone(),
                category: slot.category.clone(),
                card_id: slot.card_id.clone(),
                is_correct: slot.is_correct,
            })
        })
        .collect();

    Deck {
        entries,
        scenario_count: scenarios.len(),
    }
}
