use crate::{
    cards::{Card, Region, MAX_CARD_COPIES},
    deckcode, err,
    status::Code,
    Res,
};

use super::{DraftFormat, DraftOptions, RarityRestriction, CARDS_PER_DECK};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CardCount {
    pub card: Card,
    pub count: u32,
}

/// A deck under construction. Cloning produces a fully independent copy, so a
/// clone can be used as a sketch of a change before committing it.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDeck {
    /// Every region the deck could still end up in. Only ever shrinks.
    regions: Vec<Region>,
    card_counts: Vec<CardCount>,
    num_cards: u32,
    options: DraftOptions,
}

/// Return a copy of `card_counts` with one more copy of `card`.
fn with_card(card_counts: &[CardCount], card: &Card) -> Vec<CardCount> {
    let mut counts = card_counts.to_vec();
    match counts.iter_mut().find(|cc| cc.card.same_card(card)) {
        Some(card_count) => card_count.count += 1,
        None => counts.push(CardCount {
            card: card.clone(),
            count: 1,
        }),
    }
    counts
}

/// Calculates all pairs of regions from `possible_regions` such that every card
/// in `card_counts` is in at least one region of the pair. Empty if
/// `card_counts` is empty.
pub fn possible_region_pairs(
    card_counts: &[CardCount],
    possible_regions: &[Region],
) -> Vec<(Region, Region)> {
    let mut regions_in_deck: Vec<(Region, usize)> = possible_regions
        .iter()
        .map(|region| {
            let count = card_counts
                .iter()
                .filter(|cc| region.contains(&cc.card))
                .count();
            (*region, count)
        })
        .collect();

    // Stable, so ties keep declaration order.
    regions_in_deck.sort_by(|a, b| b.1.cmp(&a.1));

    let mut pairs = Vec::new();
    for i in 1..regions_in_deck.len() {
        let (region1, _) = regions_in_deck[i];

        for &(region2, count2) in &regions_in_deck[..i] {
            // Every region from here on is also empty, and a pair of regions
            // with no cards cannot cover the deck.
            if count2 == 0 {
                break;
            }

            if card_counts
                .iter()
                .all(|cc| region1.contains(&cc.card) || region2.contains(&cc.card))
            {
                pairs.push((region1, region2));
            }
        }
    }

    pairs
}

/// The union of every region pair valid for `card_counts`, or None if there
/// is no valid pair.
fn possible_regions_for_cards(
    card_counts: &[CardCount],
    possible_regions: &[Region],
) -> Option<Vec<Region>> {
    let mut regions = Vec::new();
    for (region1, region2) in possible_region_pairs(card_counts, possible_regions) {
        for region in [region1, region2] {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
    }

    if regions.is_empty() {
        None
    } else {
        Some(regions)
    }
}

impl DraftDeck {
    pub fn new(options: DraftOptions) -> Self {
        let regions = match (options.draft_format, options.rarity_restriction) {
            (DraftFormat::FreeBuild, _) | (_, RarityRestriction::AnyRarity) => {
                Region::ALL.to_vec()
            }
            (_, RarityRestriction::Commons) => Region::MAIN.to_vec(),
        };

        Self {
            regions,
            card_counts: Vec::new(),
            num_cards: 0,
            options,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn card_counts(&self) -> &[CardCount] {
        &self.card_counts
    }

    pub fn num_cards(&self) -> u32 {
        self.num_cards
    }

    pub fn options(&self) -> &DraftOptions {
        &self.options
    }

    pub fn is_complete(&self) -> bool {
        self.num_cards >= CARDS_PER_DECK
    }

    pub fn count_of(&self, card: &Card) -> u32 {
        self.card_counts
            .iter()
            .find(|cc| cc.card.same_card(card))
            .map(|cc| cc.count)
            .unwrap_or(0)
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.count_of(card) > 0
    }

    fn free_build(&self) -> bool {
        self.options.draft_format == DraftFormat::FreeBuild
    }

    /// The regions that appear in every region pair still possible for this
    /// deck. The remaining regions may or may not end up in the deck.
    pub fn certain_regions(&self) -> Vec<Region> {
        if self.regions.len() == 2 {
            return self.regions.clone();
        }
        if self.card_counts.is_empty() {
            return Vec::new();
        }

        let mut in_all_pairs = self.regions.clone();
        for (region1, region2) in possible_region_pairs(&self.card_counts, &self.regions) {
            in_all_pairs.retain(|region| *region == region1 || *region == region2);
            if in_all_pairs.is_empty() {
                break;
            }
        }
        in_all_pairs
    }

    /// Checks if `card` can be added without breaking the copy limit or the
    /// rule that every card must be from one of at most two regions.
    pub fn can_add(&self, card: &Card) -> bool {
        if self.count_of(card) >= MAX_CARD_COPIES {
            return false;
        }

        if self.free_build() {
            return true;
        }

        // Two remaining regions must be the regions of the deck.
        if self.regions.len() == 2 {
            return self.regions.iter().any(|region| region.contains(card));
        }

        possible_regions_for_cards(&with_card(&self.card_counts, card), &self.regions).is_some()
    }

    /// Add a card to the deck, narrowing the possible regions. Returns false,
    /// leaving the deck untouched, if the card cannot legally be added.
    pub fn add_card(&mut self, card: &Card) -> bool {
        if self.count_of(card) >= MAX_CARD_COPIES {
            return false;
        }

        let regions = if self.free_build() {
            None
        } else if self.regions.len() == 2 {
            if !self.regions.iter().any(|region| region.contains(card)) {
                return false;
            }
            None
        } else {
            let card_counts = with_card(&self.card_counts, card);
            match possible_regions_for_cards(&card_counts, &self.regions) {
                Some(regions) => Some(regions),
                None => return false,
            }
        };

        if let Some(regions) = regions {
            debug_assert!(regions.len() >= 2);
            if regions.len() < 2 {
                tracing::error!("Narrowed deck to fewer than two regions: {regions:?}");
            }
            self.regions = regions;
        }
        self.card_counts = with_card(&self.card_counts, card);
        self.num_cards += 1;

        true
    }

    /// Add every card in `cards` to a copy of this deck. Returns the new deck,
    /// or None if any card could not be added.
    pub fn add_cards(&self, cards: &[Card]) -> Option<DraftDeck> {
        let mut deck = self.clone();
        if cards.iter().all(|card| deck.add_card(card)) {
            Some(deck)
        } else {
            None
        }
    }

    /// Shareable deck code for a finished deck.
    pub fn deck_code(&self) -> Res<String> {
        if !self.is_complete() {
            return err(
                Code::IncorrectNumChosenCards,
                format!(
                    "Cannot generate deck code for deck, expect {CARDS_PER_DECK} cards, found {}.",
                    self.num_cards
                ),
            );
        }

        let cards: Vec<(&str, u32)> = self
            .card_counts
            .iter()
            .map(|cc| (cc.card.card_code.as_str(), cc.count))
            .collect();
        deckcode::encode(&cards)
    }
}
