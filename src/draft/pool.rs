use rand::{seq::SliceRandom, Rng};

use crate::{
    cards::{Card, CardCatalog, CardType},
    err,
    status::Code,
    Res,
};

use super::{deck::DraftDeck, format_contains_card};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleMode {
    /// Every possible card has an equal probability of being chosen.
    Uniform,
    /// Each region has an equal probability of being chosen, and each card
    /// within each region has an equal probability.
    RegionWeighted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    /// Any card can be chosen, regardless of whether it's in the deck already.
    AnyCard,
    /// Only cards that are already in the deck are chosen.
    FromDeck,
    /// Only cards that are not in the deck are chosen.
    NotFromDeck,
}

pub struct SampleOptions<'a> {
    pub card_type: CardType,
    pub sample_mode: SampleMode,
    pub selection_mode: SelectionMode,
    /// If false, every card chosen will come from a different region of the
    /// deck, so long as there are enough regions to go around.
    pub allow_same_region: bool,
    pub num_cards: usize,
    /// Cards incompatible with this deck are never chosen.
    pub deck: &'a DraftDeck,
    /// Cards which will not be chosen.
    pub restriction_pool: &'a [Card],
}

impl<'a> SampleOptions<'a> {
    pub fn new(card_type: CardType, num_cards: usize, deck: &'a DraftDeck) -> Self {
        Self {
            card_type,
            sample_mode: SampleMode::Uniform,
            selection_mode: SelectionMode::AnyCard,
            allow_same_region: true,
            num_cards,
            deck,
            restriction_pool: &[],
        }
    }

    pub fn sample_mode(mut self, sample_mode: SampleMode) -> Self {
        self.sample_mode = sample_mode;
        self
    }

    pub fn selection_mode(mut self, selection_mode: SelectionMode) -> Self {
        self.selection_mode = selection_mode;
        self
    }

    pub fn allow_same_region(mut self, allow_same_region: bool) -> Self {
        self.allow_same_region = allow_same_region;
        self
    }

    pub fn restriction_pool(mut self, restriction_pool: &'a [Card]) -> Self {
        self.restriction_pool = restriction_pool;
        self
    }

    fn restricted(&self, card: &Card) -> bool {
        self.restriction_pool.iter().any(|c| c.same_card(card))
    }
}

/// Draws random batches of cards from the catalog that are legal for a deck.
pub struct CardPool<'a> {
    catalog: &'a CardCatalog,
    max_redraws: u32,
}

/// (index of region in the deck's region list, index of card in that region)
type CardIndex = (usize, usize);

/// Choose `cards_to_choose` distinct indices from the concatenation of every
/// region's cards, mapping each back to its region.
fn sample_uniform<R: Rng + ?Sized>(
    total_card_count: usize,
    cumulative_totals: &[usize],
    cards_to_choose: usize,
    rng: &mut R,
) -> Vec<CardIndex> {
    rand::seq::index::sample(rng, total_card_count, cards_to_choose)
        .into_iter()
        .map(|index| {
            // Last region starting at or before index. Empty regions share a
            // start with the following region, so are never chosen.
            let region = cumulative_totals.partition_point(|&start| start <= index) - 1;
            (region, index - cumulative_totals[region])
        })
        .collect()
}

/// Choose `cards_to_choose` distinct indices by first choosing a region
/// uniformly, then a card within that region uniformly.
fn sample_by_region<R: Rng + ?Sized>(
    region_cards: &[&[Card]],
    cards_to_choose: usize,
    rng: &mut R,
) -> Vec<CardIndex> {
    let non_empty: Vec<usize> = (0..region_cards.len())
        .filter(|&region| !region_cards[region].is_empty())
        .collect();

    let mut result: Vec<CardIndex> = Vec::with_capacity(cards_to_choose);
    if non_empty.is_empty() {
        return result;
    }
    while result.len() < cards_to_choose {
        let region = non_empty[rng.gen_range(0..non_empty.len())];
        let index = (region, rng.gen_range(0..region_cards[region].len()));
        if !result.contains(&index) {
            result.push(index);
        }
    }
    result
}

fn contains_duplicates<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, item)| items[..i].contains(item))
}

impl<'a> CardPool<'a> {
    pub fn new(catalog: &'a CardCatalog, max_redraws: u32) -> Self {
        Self {
            catalog,
            max_redraws,
        }
    }

    /// Randomly choose up to `opts.num_cards` cards which can each be added
    /// to the deck. Fewer cards are returned if fewer are available.
    pub fn sample<R: Rng + ?Sized>(&self, opts: &SampleOptions, rng: &mut R) -> Res<Vec<Card>> {
        match opts.selection_mode {
            SelectionMode::FromDeck => Ok(self.sample_from_deck(opts, rng)),
            SelectionMode::AnyCard | SelectionMode::NotFromDeck => {
                self.sample_from_regions(opts, rng)
            }
        }
    }

    fn sample_from_deck<R: Rng + ?Sized>(&self, opts: &SampleOptions, rng: &mut R) -> Vec<Card> {
        let deck = opts.deck;
        let cards: Vec<&Card> = deck
            .card_counts()
            .iter()
            .map(|cc| &cc.card)
            .filter(|card| opts.card_type.matches(card) && deck.can_add(card))
            .collect();

        let num_cards = opts.num_cards.min(cards.len());
        cards
            .choose_multiple(rng, num_cards)
            .map(|card| (*card).clone())
            .collect()
    }

    fn sample_from_regions<R: Rng + ?Sized>(
        &self,
        opts: &SampleOptions,
        rng: &mut R,
    ) -> Res<Vec<Card>> {
        let deck = opts.deck;
        let region_pool = deck.regions();
        if region_pool.is_empty() {
            debug_assert!(false, "Deck has no possible regions.");
            tracing::error!("Sampling cards for a deck with no possible regions.");
            return Ok(Vec::new());
        }

        let region_cards: Vec<&[Card]> = region_pool
            .iter()
            .map(|region| self.catalog.cards_of(*region, opts.card_type))
            .collect();
        let mut cumulative_totals = Vec::with_capacity(region_cards.len());
        let mut total_card_count = 0;
        for cards in &region_cards {
            cumulative_totals.push(total_card_count);
            total_card_count += cards.len();
        }

        // Ineligible cards are cards that, if chosen, would trigger a redraw.
        // This is an estimate: multi-region cards are counted once per region
        // and format restrictions are not considered.
        let mut ineligible: Vec<&Card> = opts.restriction_pool.iter().collect();
        ineligible.extend(deck.card_counts().iter().map(|cc| &cc.card).filter(|card| {
            opts.card_type.matches(card) && !deck.can_add(card) && !opts.restricted(card)
        }));
        let ineligible_count: usize = region_pool
            .iter()
            .map(|region| ineligible.iter().filter(|card| region.contains(card)).count())
            .sum();
        let total_eligible_card_count = total_card_count.saturating_sub(ineligible_count);
        let cards_to_choose = opts.num_cards.min(total_eligible_card_count);

        for _ in 0..self.max_redraws {
            let indices = match opts.sample_mode {
                SampleMode::Uniform => {
                    sample_uniform(total_card_count, &cumulative_totals, cards_to_choose, rng)
                }
                SampleMode::RegionWeighted => sample_by_region(&region_cards, cards_to_choose, rng),
            };
            let cards: Vec<&Card> = indices
                .iter()
                .map(|&(region, index)| &region_cards[region][index])
                .collect();

            if !self.accept_normalized(opts, &region_cards, &indices, &cards, rng) {
                continue;
            }

            let regions: Vec<usize> = indices.iter().map(|(region, _)| *region).collect();
            let codes: Vec<&str> = cards.iter().map(|card| card.card_code.as_str()).collect();
            let rejected = (!opts.allow_same_region
                && cards_to_choose <= region_pool.len()
                && contains_duplicates(&regions))
                || cards
                    .iter()
                    .any(|card| !format_contains_card(deck.options(), card))
                || (opts.selection_mode == SelectionMode::NotFromDeck
                    && cards.iter().any(|card| deck.contains(card)))
                // Multi-region cards can be drawn once through each region.
                || contains_duplicates(&codes)
                // Pairs of cards may still be incompatible with each other,
                // that is checked when the cards are chosen.
                || cards
                    .iter()
                    .any(|card| !deck.can_add(card) || opts.restricted(card));
            if rejected {
                continue;
            }

            return Ok(cards.into_iter().cloned().collect());
        }

        tracing::warn!(
            "Failed to draw {cards_to_choose} cards after {} attempts.",
            self.max_redraws
        );
        err(
            Code::MaxRedrawsExceeded,
            "Failed to choose cards after many attempts.",
        )
    }

    /// Cards in several of the deck's regions can be drawn through each of
    /// them. Randomly discard draws containing such cards so that they are not
    /// over represented.
    fn accept_normalized<R: Rng + ?Sized>(
        &self,
        opts: &SampleOptions,
        region_cards: &[&[Card]],
        indices: &[CardIndex],
        cards: &[&Card],
        rng: &mut R,
    ) -> bool {
        let region_pool = opts.deck.regions();
        cards.iter().zip(indices).all(|(card, &(region, _))| {
            let containing: Vec<usize> = (0..region_pool.len())
                .filter(|&r| region_pool[r].contains(card))
                .collect();
            if containing.len() <= 1 {
                return true;
            }

            match opts.sample_mode {
                // Take each card once every N times, where N is the number of
                // regions it was drawable from.
                SampleMode::Uniform => rng.gen_bool(1.0 / containing.len() as f64),
                // Take the card with probability 1 / (size * sum(1 / size_i))
                // over the regions containing it. This keeps a card shared by
                // a small and a large region almost as likely as the other
                // cards of the small region.
                SampleMode::RegionWeighted => {
                    let region_size = region_cards[region].len() as f64;
                    let weighted_sizes: f64 = containing
                        .iter()
                        .map(|&r| 1.0 / region_cards[r].len().max(1) as f64)
                        .sum();
                    rng.gen_bool((1.0 / (region_size * weighted_sizes)).min(1.0))
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::cards::{Card, CardCatalog, CardType, Rarity, Region};
    use crate::draft::{
        deck::DraftDeck, format_contains_card, DraftFormat, DraftOptions, RarityRestriction,
    };
    use crate::status::Code;

    use super::*;

    fn eternal() -> DraftOptions {
        DraftOptions::new(DraftFormat::Eternal, RarityRestriction::AnyRarity)
    }

    fn assert_legal_batch(deck: &DraftDeck, cards: &[Card]) {
        let codes: Vec<&str> = cards.iter().map(|c| c.card_code.as_str()).collect();
        assert!(!contains_duplicates(&codes));
        assert!(cards
            .iter()
            .all(|card| deck.can_add(card) && format_contains_card(deck.options(), card)));
    }

    #[test]
    fn test_sample_champs() {
        let catalog = CardCatalog::sample(3, 10);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal());
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let opts = SampleOptions::new(CardType::Champ, 4, &deck).allow_same_region(false);
            let cards = pool.sample(&opts, &mut rng).unwrap();
            assert_eq!(cards.len(), 4);
            assert!(cards.iter().all(|c| c.is_champion()));
            assert_legal_batch(&deck, &cards);

            // All from different regions.
            let regions: Vec<Region> = cards.iter().map(|c| c.regions[0]).collect();
            assert!(!contains_duplicates(&regions));
        }
    }

    #[test]
    fn test_sample_respects_deck_regions() {
        let catalog = CardCatalog::sample(2, 10);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                Card::sample(Rarity::Common, &[Region::Demacia]),
                Card::sample(Rarity::Common, &[Region::Noxus]),
            ])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for mode in [SampleMode::Uniform, SampleMode::RegionWeighted] {
            for _ in 0..20 {
                let opts = SampleOptions::new(CardType::NonChamp, 4, &deck).sample_mode(mode);
                let cards = pool.sample(&opts, &mut rng).unwrap();
                assert_eq!(cards.len(), 4);
                assert!(cards.iter().all(|c| !c.is_champion()));
                assert!(cards.iter().all(|c| c.regions[0] == Region::Demacia
                    || c.regions[0] == Region::Noxus));
                assert_legal_batch(&deck, &cards);
            }
        }
    }

    #[test]
    fn test_sample_shrinks_to_available() {
        let catalog = CardCatalog::sample(1, 2);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                Card::sample(Rarity::Common, &[Region::Ionia]),
                Card::sample(Rarity::Common, &[Region::Targon]),
            ])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        // Only two champions exist in Ionia and Targon.
        let opts = SampleOptions::new(CardType::Champ, 4, &deck);
        let cards = pool.sample(&opts, &mut rng).unwrap();
        assert_eq!(cards.len(), 2);
        assert_legal_batch(&deck, &cards);
    }

    #[test]
    fn test_same_region_check_skipped_for_large_draws() {
        let catalog = CardCatalog::sample(3, 10);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                Card::sample(Rarity::Common, &[Region::Shurima]),
                Card::sample(Rarity::Common, &[Region::Freljord]),
            ])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        // Four cards cannot come from two distinct regions.
        let opts = SampleOptions::new(CardType::Champ, 4, &deck).allow_same_region(false);
        let cards = pool.sample(&opts, &mut rng).unwrap();
        assert_eq!(cards.len(), 4);
        assert_legal_batch(&deck, &cards);
    }

    #[test]
    fn test_restriction_pool() {
        let catalog = CardCatalog::sample(3, 0);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[Card::sample(Rarity::Common, &[Region::Bilgewater])])
            .unwrap()
            .add_cards(&[Card::sample(Rarity::Common, &[Region::BandleCity])])
            .unwrap();
        let restricted: Vec<Card> = catalog.cards_of(Region::Bilgewater, CardType::Champ).to_vec();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..10 {
            let opts = SampleOptions::new(CardType::Champ, 4, &deck).restriction_pool(&restricted);
            let cards = pool.sample(&opts, &mut rng).unwrap();
            assert_eq!(cards.len(), 3);
            assert!(cards.iter().all(|c| c.regions[0] == Region::BandleCity));
        }
    }

    #[test]
    fn test_from_deck() {
        let catalog = CardCatalog::sample(1, 1);
        let pool = CardPool::new(&catalog, 200);
        let champ = Card::sample(Rarity::Champion, &[Region::Demacia]);
        let maxed = Card::sample(Rarity::Champion, &[Region::Demacia]);
        let follower = Card::sample(Rarity::Common, &[Region::Demacia]);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                champ.clone(),
                maxed.clone(),
                maxed.clone(),
                maxed,
                follower,
            ])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let opts = SampleOptions::new(CardType::Champ, 2, &deck)
            .selection_mode(SelectionMode::FromDeck);
        assert_eq!(pool.sample(&opts, &mut rng).unwrap(), vec![champ]);
    }

    #[test]
    fn test_not_from_deck() {
        let catalog = CardCatalog::sample(0, 4);
        let pool = CardPool::new(&catalog, 200);
        let in_deck = catalog.cards_of(Region::Demacia, CardType::NonChamp)[0].clone();
        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                in_deck.clone(),
                Card::sample(Rarity::Common, &[Region::Noxus]),
            ])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..20 {
            let opts = SampleOptions::new(CardType::NonChamp, 2, &deck)
                .selection_mode(SelectionMode::NotFromDeck);
            let cards = pool.sample(&opts, &mut rng).unwrap();
            assert_eq!(cards.len(), 2);
            assert!(cards.iter().all(|c| !c.same_card(&in_deck)));
        }
    }

    #[test]
    fn test_format_filter() {
        let mut catalog = CardCatalog::new();
        for region in Region::MAIN {
            catalog.add(Card::sample(Rarity::Common, &[region]));
            catalog.add(Card::sample(Rarity::Rare, &[region]));
        }
        let pool = CardPool::new(&catalog, 200);
        let options = DraftOptions::new(DraftFormat::Eternal, RarityRestriction::Commons);
        let deck = DraftDeck::new(options);
        let mut rng = StdRng::seed_from_u64(13);

        for _ in 0..10 {
            let opts = SampleOptions::new(CardType::NonChamp, 3, &deck);
            let cards = pool.sample(&opts, &mut rng).unwrap();
            assert_eq!(cards.len(), 3);
            assert!(cards.iter().all(|c| c.rarity == Rarity::Common));
        }
    }

    #[test]
    fn test_max_redraws() {
        // Every card is rare, so a commons draft can never accept a draw.
        let mut catalog = CardCatalog::new();
        for region in Region::MAIN {
            catalog.add(Card::sample(Rarity::Rare, &[region]));
        }
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(DraftOptions::new(
            DraftFormat::Standard,
            RarityRestriction::Commons,
        ));
        let mut rng = StdRng::seed_from_u64(17);

        let opts = SampleOptions::new(CardType::NonChamp, 1, &deck);
        let status = pool.sample(&opts, &mut rng).unwrap_err();
        assert_eq!(status.code, Code::MaxRedrawsExceeded);
    }

    #[test]
    fn test_multi_region_cards_not_duplicated() {
        let mut catalog = CardCatalog::new();
        let dual = Card::sample(Rarity::Common, &[Region::Demacia, Region::Noxus]);
        catalog.add(dual.clone());
        catalog.add(Card::sample(Rarity::Common, &[Region::Demacia]));
        catalog.add(Card::sample(Rarity::Common, &[Region::Noxus]));
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal())
            .add_cards(&[dual.clone(), Card::sample(Rarity::Common, &[Region::Demacia])])
            .unwrap()
            .add_cards(&[Card::sample(Rarity::Common, &[Region::Noxus])])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(21);

        for mode in [SampleMode::Uniform, SampleMode::RegionWeighted] {
            for _ in 0..20 {
                let opts = SampleOptions::new(CardType::NonChamp, 3, &deck).sample_mode(mode);
                let cards = pool.sample(&opts, &mut rng).unwrap();
                assert_legal_batch(&deck, &cards);
            }
        }
    }

    /// Catalog with one card in both Demacia and Noxus, `demacia` cards only in
    /// Demacia and `noxus` cards only in Noxus, and a deck limited to those two
    /// regions. Returns the dual region card and the first Demacia only card.
    fn dual_region_setup(demacia: usize, noxus: usize) -> (CardCatalog, DraftDeck, Card, Card) {
        let mut catalog = CardCatalog::new();
        let dual = Card::sample(Rarity::Common, &[Region::Demacia, Region::Noxus]);
        catalog.add(dual.clone());
        let demacia_cards: Vec<Card> = (0..demacia)
            .map(|_| Card::sample(Rarity::Common, &[Region::Demacia]))
            .collect();
        for card in &demacia_cards {
            catalog.add(card.clone());
        }
        for _ in 0..noxus {
            catalog.add(Card::sample(Rarity::Common, &[Region::Noxus]));
        }

        let deck = DraftDeck::new(eternal())
            .add_cards(&[
                Card::sample(Rarity::Common, &[Region::Demacia]),
                Card::sample(Rarity::Common, &[Region::Noxus]),
            ])
            .unwrap();
        assert_eq!(deck.regions().len(), 2);

        (catalog, deck, dual, demacia_cards[0].clone())
    }

    /// Share of `draws` single card samples which were `target`.
    fn share_of(
        pool: &CardPool,
        deck: &DraftDeck,
        mode: SampleMode,
        target: &Card,
        draws: usize,
        rng: &mut StdRng,
    ) -> f64 {
        let hits = (0..draws)
            .filter(|_| {
                let opts = SampleOptions::new(CardType::NonChamp, 1, deck).sample_mode(mode);
                pool.sample(&opts, &mut *rng).unwrap()[0].same_card(target)
            })
            .count();
        hits as f64 / draws as f64
    }

    #[test]
    fn test_uniform_multi_region_share() {
        // Four entries, the dual card listed under both regions. Without
        // normalisation it would be drawn half the time.
        let (catalog, deck, dual, single) = dual_region_setup(1, 1);
        let pool = CardPool::new(&catalog, 200);
        let mut rng = StdRng::seed_from_u64(31);

        let dual_share = share_of(&pool, &deck, SampleMode::Uniform, &dual, 6000, &mut rng);
        assert!((dual_share - 1.0 / 3.0).abs() < 0.04, "{dual_share}");
        let single_share = share_of(&pool, &deck, SampleMode::Uniform, &single, 6000, &mut rng);
        assert!((single_share - 1.0 / 3.0).abs() < 0.04, "{single_share}");
    }

    #[test]
    fn test_region_weighted_multi_region_share() {
        // Equal regions: without normalisation the dual card would come up
        // half the time.
        let (catalog, deck, dual, _) = dual_region_setup(1, 1);
        let pool = CardPool::new(&catalog, 200);
        let mut rng = StdRng::seed_from_u64(37);
        let share = share_of(&pool, &deck, SampleMode::RegionWeighted, &dual, 6000, &mut rng);
        assert!((share - 1.0 / 3.0).abs() < 0.04, "{share}");

        // A region of 2 cards and one of 100, sharing a card. The shared card
        // should be nearly as likely as the other card of the small region.
        let (catalog, deck, dual, single) = dual_region_setup(1, 99);
        let pool = CardPool::new(&catalog, 200);
        let dual_share =
            share_of(&pool, &deck, SampleMode::RegionWeighted, &dual, 20000, &mut rng);
        let single_share =
            share_of(&pool, &deck, SampleMode::RegionWeighted, &single, 20000, &mut rng);
        assert!((single_share - 0.25).abs() < 0.02, "{single_share}");
        assert!((dual_share - single_share).abs() < 0.025, "{dual_share} {single_share}");
    }

    #[test]
    fn test_empty_request() {
        let catalog = CardCatalog::sample(1, 1);
        let pool = CardPool::new(&catalog, 200);
        let deck = DraftDeck::new(eternal());
        let mut rng = StdRng::seed_from_u64(0);
        let opts = SampleOptions::new(CardType::Champ, 0, &deck);
        assert!(pool.sample(&opts, &mut rng).unwrap().is_empty());
    }
}
