//! Collection snapshots and the pure inventory projection the grid renders.

use std::fmt;

use crate::deck::EditSession;
use crate::models::{Card, CollectionData};

/// Whose collection is on screen. Friends are read-only: no deck panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    Own,
    Friend { id: String, display_name: String },
}

impl ViewTarget {
    /// The id segment of `/api/collection/{id}`. `"@me"` is the server's
    /// sentinel for the authenticated user.
    pub fn wire_id(&self) -> &str {
        match self {
            ViewTarget::Own => "@me",
            ViewTarget::Friend { id, .. } => id,
        }
    }

    pub fn is_own(&self) -> bool {
        matches!(self, ViewTarget::Own)
    }
}

/// One loaded collection. Replaced wholesale on every successful load,
/// never patched in place.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    pub target: ViewTarget,
    pub inventory: Vec<Card>,
    decks: Vec<Vec<String>>,
}

impl CollectionStore {
    pub fn new(target: ViewTarget, data: CollectionData) -> Self {
        Self {
            target,
            inventory: data.inventory,
            decks: data.decks.unwrap_or_default(),
        }
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.inventory.iter().find(|c| c.id == card_id)
    }

    pub fn deck_count(&self) -> usize {
        self.decks.len()
    }

    /// The packed card list last persisted for `index`; empty when out of
    /// range or when viewing a friend.
    pub fn deck(&self, index: usize) -> &[String] {
        self.decks.get(index).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Number,
    Attack,
    Health,
    Tier,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Name,
        SortKey::Number,
        SortKey::Attack,
        SortKey::Health,
        SortKey::Tier,
    ];
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Name => "Sort by Name",
            SortKey::Number => "Sort by Number",
            SortKey::Attack => "Sort by Attack",
            SortKey::Health => "Sort by Health",
            SortKey::Tier => "Sort by Tier",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn toggled(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// Projects the inventory for the grid: substring search over name, number
/// and ability, exclusion of cards already slotted in the active edit
/// session, then the chosen sort.
pub fn visible_inventory<'a>(
    store: &'a CollectionStore,
    search: &str,
    key: SortKey,
    dir: SortDir,
    session: Option<&EditSession>,
) -> Vec<&'a Card> {
    let term = search.trim().to_lowercase();
    let mut cards: Vec<&Card> = store
        .inventory
        .iter()
        .filter(|card| term.is_empty() || matches_search(card, &term))
        .filter(|card| session.map_or(true, |s| !s.contains(&card.id)))
        .collect();

    cards.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Number => a.number.cmp(&b.number),
            SortKey::Attack => a.ap.cmp(&b.ap),
            SortKey::Health => a.hp.cmp(&b.hp),
            SortKey::Tier => a.tier.cmp(&b.tier),
        };
        match dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
    cards
}

fn matches_search(card: &Card, term: &str) -> bool {
    card.name.to_lowercase().contains(term)
        || card.number.to_string().contains(term)
        || card
            .ability
            .as_ref()
            .is_some_and(|a| a.to_lowercase().contains(term))
}
