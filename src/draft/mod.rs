use std::time::Duration;

use crate::cards::{Card, Rarity};

pub mod deck;
pub mod game;
pub mod handlers;
pub mod pool;
pub mod server;

/// Number of cards offered in a champion round.
pub const POOL_SIZE: usize = 4;

/// The total number of cards in a complete deck.
pub const CARDS_PER_DECK: u32 = 40;

pub const RANDOM_SELECTION_1_CARD_CUTOFF: u32 = 20;
pub const RANDOM_SELECTION_2_CARD_CUTOFF: u32 = 37;
pub const RANDOM_SELECTION_3_CARD_CUTOFF: u32 = 43;

/// Attempts the sampler makes at drawing a legal batch before giving up.
pub const MAX_CARD_REPICK_ITERATIONS: u32 = 200;

/// Sessions untouched for this long are discarded.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Cards offered when entering the initial selection or a champion round.
    pub pool_size: usize,
    /// Cards offered on each pick of a random selection round.
    pub random_selection_pool_size: usize,
    /// Champions already in the deck offered again in champion rounds 1 and 2.
    pub guaranteed_deck_champs: usize,
    /// Deck size at which each random selection round ends.
    pub random_selection_cutoffs: [u32; 3],
    pub max_redraws: u32,
    pub session_idle_timeout: Duration,
}

impl DraftConfig {
    pub fn new() -> Self {
        DraftConfig {
            pool_size: POOL_SIZE,
            random_selection_pool_size: 1,
            guaranteed_deck_champs: 2,
            random_selection_cutoffs: [
                RANDOM_SELECTION_1_CARD_CUTOFF,
                RANDOM_SELECTION_2_CARD_CUTOFF,
                RANDOM_SELECTION_3_CARD_CUTOFF,
            ],
            max_redraws: MAX_CARD_REPICK_ITERATIONS,
            session_idle_timeout: SESSION_IDLE_TIMEOUT,
        }
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftFormat {
    Standard,
    Eternal,
    /// No region restrictions at all.
    FreeBuild,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RarityRestriction {
    Commons,
    AnyRarity,
}

/// Options chosen when joining a draft, fixed for the life of the draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOptions {
    pub draft_format: DraftFormat,
    pub rarity_restriction: RarityRestriction,
}

impl DraftOptions {
    pub fn new(draft_format: DraftFormat, rarity_restriction: RarityRestriction) -> Self {
        Self {
            draft_format,
            rarity_restriction,
        }
    }
}

/// Checks whether the given card is part of the format the options describe.
pub fn format_contains_card(options: &DraftOptions, card: &Card) -> bool {
    if options.draft_format == DraftFormat::Standard && !card.is_standard {
        return false;
    }

    match options.rarity_restriction {
        RarityRestriction::AnyRarity => true,
        RarityRestriction::Commons => card.rarity == Rarity::Common,
    }
}
