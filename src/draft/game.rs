use rand::Rng;

use crate::{
    cards::{Card, CardCatalog, CardType, Region},
    err,
    status::Code,
    Res,
};

use super::{
    deck::DraftDeck,
    pool::{CardPool, SampleOptions, SelectionMode},
    DraftConfig, DraftOptions,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftState {
    Init,
    InitialSelection,
    // rename_all puts no separator before digits.
    #[serde(rename = "RANDOM_SELECTION_1")]
    RandomSelection1,
    #[serde(rename = "CHAMP_ROUND_1")]
    ChampRound1,
    #[serde(rename = "RANDOM_SELECTION_2")]
    RandomSelection2,
    #[serde(rename = "CHAMP_ROUND_2")]
    ChampRound2,
    #[serde(rename = "RANDOM_SELECTION_3")]
    RandomSelection3,
    #[serde(rename = "CHAMP_ROUND_3")]
    ChampRound3,
    GenerateCode,
}

impl DraftState {
    /// The (min, max) number of cards that must be chosen from the pool
    /// offered in this state. None if no pool is offered.
    pub fn card_limits(self) -> Option<(usize, usize)> {
        match self {
            DraftState::InitialSelection => Some((2, 2)),
            DraftState::RandomSelection1
            | DraftState::RandomSelection2
            | DraftState::RandomSelection3 => Some((1, 1)),
            DraftState::ChampRound1 | DraftState::ChampRound2 | DraftState::ChampRound3 => {
                Some((0, 2))
            }
            DraftState::Init | DraftState::GenerateCode => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftEvent {
    /// Start the draft.
    Begin,
    /// A selection was made from the offered pool.
    Advance,
}

/// Cards to offer on entering a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offer {
    pub card_type: CardType,
    pub size: usize,
    pub allow_same_region: bool,
    /// How many of the offered cards should be drawn from the deck itself.
    pub from_deck: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Offer(Offer),
    GenerateCode,
}

fn random_selection(config: &DraftConfig) -> Effect {
    Effect::Offer(Offer {
        card_type: CardType::NonChamp,
        size: config.random_selection_pool_size,
        allow_same_region: true,
        from_deck: 0,
    })
}

fn champ_round(config: &DraftConfig, from_deck: usize) -> Effect {
    Effect::Offer(Offer {
        card_type: CardType::Champ,
        size: config.pool_size,
        allow_same_region: true,
        from_deck,
    })
}

/// Compute the state following `state` on `event`, for a deck now holding
/// `num_cards` cards, along with what must happen on entering it.
pub fn transition(
    state: DraftState,
    event: DraftEvent,
    num_cards: u32,
    config: &DraftConfig,
) -> Res<(DraftState, Effect)> {
    let [cutoff1, cutoff2, cutoff3] = config.random_selection_cutoffs;

    let next = match (state, event) {
        (DraftState::GenerateCode, _) => {
            return err(Code::DraftComplete, "Draft is already complete.");
        }
        (DraftState::Init, DraftEvent::Begin) => (
            DraftState::InitialSelection,
            Effect::Offer(Offer {
                card_type: CardType::Champ,
                size: config.pool_size,
                allow_same_region: false,
                from_deck: 0,
            }),
        ),
        (DraftState::Init, DraftEvent::Advance) | (_, DraftEvent::Begin) => {
            return err(
                Code::InvalidStateTransition,
                format!("Cannot handle {event:?} in state {state:?}."),
            );
        }
        (DraftState::InitialSelection, DraftEvent::Advance) => {
            (DraftState::RandomSelection1, random_selection(config))
        }
        (DraftState::RandomSelection1, DraftEvent::Advance) => {
            if num_cards >= cutoff1 {
                (
                    DraftState::ChampRound1,
                    champ_round(config, config.guaranteed_deck_champs),
                )
            } else {
                (DraftState::RandomSelection1, random_selection(config))
            }
        }
        (DraftState::ChampRound1, DraftEvent::Advance) => {
            (DraftState::RandomSelection2, random_selection(config))
        }
        (DraftState::RandomSelection2, DraftEvent::Advance) => {
            if num_cards >= cutoff2 {
                (
                    DraftState::ChampRound2,
                    champ_round(config, config.guaranteed_deck_champs),
                )
            } else {
                (DraftState::RandomSelection2, random_selection(config))
            }
        }
        (DraftState::ChampRound2, DraftEvent::Advance) => {
            (DraftState::RandomSelection3, random_selection(config))
        }
        (DraftState::RandomSelection3, DraftEvent::Advance) => {
            if num_cards >= cutoff3 {
                (DraftState::ChampRound3, champ_round(config, 0))
            } else {
                (DraftState::RandomSelection3, random_selection(config))
            }
        }
        (DraftState::ChampRound3, DraftEvent::Advance) => {
            (DraftState::GenerateCode, Effect::GenerateCode)
        }
    };

    Ok(next)
}

/// Draw the cards for an offer. Cards drawn from the deck come first, the
/// remainder of the offer is filled with cards not already offered.
fn draw_offer<R: Rng + ?Sized>(
    offer: &Offer,
    deck: &DraftDeck,
    catalog: &CardCatalog,
    config: &DraftConfig,
    rng: &mut R,
) -> Res<Vec<Card>> {
    let pool = CardPool::new(catalog, config.max_redraws);

    let mut cards = if offer.from_deck > 0 {
        let opts = SampleOptions::new(offer.card_type, offer.from_deck.min(offer.size), deck)
            .selection_mode(SelectionMode::FromDeck);
        pool.sample(&opts, rng)?
    } else {
        Vec::new()
    };

    let opts = SampleOptions::new(offer.card_type, offer.size - cards.len(), deck)
        .allow_same_region(offer.allow_same_region)
        .restriction_pool(&cards);
    let fresh = pool.sample(&opts, rng)?;
    cards.extend(fresh);

    Ok(cards)
}

/// Snapshot of a draft, as reported to the client.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStateInfo {
    pub state: DraftState,
    pub deck: DraftDeck,
    /// Regions the deck is sure to end up in.
    pub certain_regions: Vec<Region>,
    pub pending_cards: Vec<Card>,
    pub deck_code: Option<String>,
}

/// A single player's draft. Every operation either succeeds completely or
/// leaves the draft as it was.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    state: DraftState,
    deck: DraftDeck,
    /// The pool offered in the current state.
    pending_cards: Vec<Card>,
    deck_code: Option<String>,
}

impl Draft {
    pub fn new(options: DraftOptions) -> Self {
        Self {
            state: DraftState::Init,
            deck: DraftDeck::new(options),
            pending_cards: Vec::new(),
            deck_code: None,
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn deck(&self) -> &DraftDeck {
        &self.deck
    }

    pub fn pending_cards(&self) -> &[Card] {
        &self.pending_cards
    }

    pub fn info(&self) -> DraftStateInfo {
        DraftStateInfo {
            state: self.state,
            deck: self.deck.clone(),
            certain_regions: self.deck.certain_regions(),
            pending_cards: self.pending_cards.clone(),
            deck_code: self.deck_code.clone(),
        }
    }

    /// Work out the state following `event` for `deck` and perform its entry
    /// effect. Nothing is committed.
    fn enter<R: Rng + ?Sized>(
        &self,
        event: DraftEvent,
        deck: &DraftDeck,
        catalog: &CardCatalog,
        config: &DraftConfig,
        rng: &mut R,
    ) -> Res<(DraftState, Vec<Card>, Option<String>)> {
        let (state, effect) = transition(self.state, event, deck.num_cards(), config)?;
        tracing::debug!(
            "Draft transition {:?} -> {state:?} with {} cards.",
            self.state,
            deck.num_cards()
        );

        match effect {
            Effect::Offer(offer) => {
                let cards = draw_offer(&offer, deck, catalog, config, rng)?;
                let min = state.card_limits().map(|(min, _)| min).unwrap_or(0);
                if cards.len() < min {
                    return err(
                        Code::NoEligibleCards,
                        format!(
                            "Only {} eligible cards for {state:?}, need at least {min}.",
                            cards.len()
                        ),
                    );
                }
                Ok((state, cards, None))
            }
            Effect::GenerateCode => Ok((state, Vec::new(), Some(deck.deck_code()?))),
        }
    }

    /// Start the draft, offering the initial selection of champions.
    pub fn begin<R: Rng + ?Sized>(
        &mut self,
        catalog: &CardCatalog,
        config: &DraftConfig,
        rng: &mut R,
    ) -> Res<Vec<Card>> {
        let (state, cards, _) = self.enter(DraftEvent::Begin, &self.deck, catalog, config, rng)?;
        self.state = state;
        self.pending_cards = cards.clone();
        Ok(cards)
    }

    /// The pool to choose from in the current state, beginning the draft if
    /// it hasn't begun.
    pub fn next_pool<R: Rng + ?Sized>(
        &mut self,
        catalog: &CardCatalog,
        config: &DraftConfig,
        rng: &mut R,
    ) -> Res<(Vec<Card>, DraftState)> {
        match self.state {
            DraftState::GenerateCode => err(Code::DraftComplete, "Draft is already complete."),
            DraftState::Init => Ok((self.begin(catalog, config, rng)?, self.state)),
            state => Ok((self.pending_cards.clone(), state)),
        }
    }

    /// Choose cards, identified by card code, from the pending pool. On
    /// success the cards are added to the deck and the draft moves to its
    /// next state.
    pub fn choose_cards<R: Rng + ?Sized>(
        &mut self,
        codes: &[String],
        catalog: &CardCatalog,
        config: &DraftConfig,
        rng: &mut R,
    ) -> Res<DraftStateInfo> {
        let Some((min, max)) = self.state.card_limits() else {
            return err(
                Code::NotWaitingForCardSelection,
                format!("Not waiting for a card selection in state {:?}.", self.state),
            );
        };

        if codes.len() < min || codes.len() > max {
            return err(
                Code::IncorrectNumChosenCards,
                format!(
                    "Expected between {min} and {max} cards, received {}.",
                    codes.len()
                ),
            );
        }

        // Each code must match its own pending card, so choosing a card twice
        // requires it to have been offered twice.
        let mut remaining: Vec<&Card> = self.pending_cards.iter().collect();
        let mut chosen = Vec::with_capacity(codes.len());
        for code in codes {
            let Some(index) = remaining.iter().position(|card| card.card_code == *code) else {
                return err(
                    Code::NotPendingCard,
                    format!("Card {code} is not in the offered pool."),
                );
            };
            chosen.push(remaining.swap_remove(index).clone());
        }

        let Some(deck) = self.deck.add_cards(&chosen) else {
            return err(
                Code::IllegalCardCombination,
                "Chosen cards cannot all be added to the deck.",
            );
        };

        let (state, cards, deck_code) =
            self.enter(DraftEvent::Advance, &deck, catalog, config, rng)?;
        self.state = state;
        self.deck = deck;
        self.pending_cards = cards;
        self.deck_code = deck_code;

        Ok(self.info())
    }
}
