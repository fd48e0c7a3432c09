use std::collections::HashMap;

pub mod region;
pub mod setpack;

pub use region::Region;

/// Most copies of a single card allowed in a deck.
pub const MAX_CARD_COPIES: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Champion,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CardKind {
    Unit,
    Spell,
    Equipment,
    Landmark,
    Trap,
    Ability,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_code: String,
    pub name: String,
    pub cost: u32,
    pub rarity: Rarity,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub regions: Vec<Region>,
    pub subtypes: Vec<String>,
    pub keywords: Vec<String>,
    pub description: String,
    pub image_url: String,
    pub full_image_url: String,
    pub is_standard: bool,
}

impl Card {
    pub fn is_champion(&self) -> bool {
        self.rarity == Rarity::Champion
    }

    pub fn same_card(&self, other: &Card) -> bool {
        self.card_code == other.card_code
    }

    #[cfg(test)]
    pub fn sample(rarity: Rarity, regions: &[Region]) -> Self {
        static ID: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(1);

        let id = ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let faction = match regions.first() {
            Some(Region::Demacia) => "DE",
            Some(Region::Noxus) => "NX",
            Some(Region::Shurima) => "SH",
            Some(Region::PiltoverZaun) => "PZ",
            Some(Region::Freljord) => "FR",
            Some(Region::Targon) => "MT",
            Some(Region::ShadowIsles) => "SI",
            Some(Region::BandleCity) => "BC",
            Some(Region::Bilgewater) => "BW",
            Some(Region::Ionia) => "IO",
            _ => "RU",
        };
        Self {
            card_code: format!("99{faction}{id:03}"),
            name: format!("Card {id}"),
            cost: (id % 8) as u32,
            rarity,
            kind: if rarity == Rarity::Champion {
                CardKind::Unit
            } else {
                CardKind::Spell
            },
            regions: regions.to_vec(),
            subtypes: Vec::new(),
            keywords: Vec::new(),
            description: format!("Text for test card {id}."),
            image_url: format!("https://example.com/card-{id}.png"),
            full_image_url: format!("https://example.com/card-{id}-full.png"),
            is_standard: true,
        }
    }
}

/// Whether a draw is for champions or for every other card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardType {
    Champ,
    NonChamp,
}

impl CardType {
    pub fn matches(self, card: &Card) -> bool {
        card.is_champion() == (self == CardType::Champ)
    }
}

/// Cards playable in a single region, split by whether they are champions.
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    pub champs: Vec<Card>,
    pub non_champs: Vec<Card>,
}

impl RegionSet {
    pub fn cards(&self, card_type: CardType) -> &[Card] {
        match card_type {
            CardType::Champ => &self.champs,
            CardType::NonChamp => &self.non_champs,
        }
    }
}

/// Every collectible card, loaded once at start up and read only afterwards.
pub struct CardCatalog {
    /// Map from card code to card.
    code_to_card: HashMap<String, Card>,
    region_sets: HashMap<Region, RegionSet>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self {
            code_to_card: HashMap::new(),
            region_sets: Region::ALL
                .iter()
                .map(|region| (*region, RegionSet::default()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn sample(champs: usize, non_champs: usize) -> Self {
        let mut catalog = Self::new();
        for region in Region::MAIN {
            for _ in 0..champs {
                catalog.add(Card::sample(Rarity::Champion, &[region]));
            }
            for _ in 0..non_champs {
                catalog.add(Card::sample(Rarity::Common, &[region]));
            }
        }
        catalog
    }

    pub fn add(&mut self, card: Card) {
        if self.code_to_card.contains_key(&card.card_code) {
            tracing::warn!("Duplicate card code {} in catalog.", card.card_code);
            return;
        }

        for (region, set) in self.region_sets.iter_mut() {
            if region.contains(&card) {
                if card.is_champion() {
                    set.champs.push(card.clone());
                } else {
                    set.non_champs.push(card.clone());
                }
            }
        }
        self.code_to_card.insert(card.card_code.clone(), card);
    }

    pub fn get(&self, code: &str) -> Option<&Card> {
        self.code_to_card.get(code)
    }

    pub fn cards_of(&self, region: Region, card_type: CardType) -> &[Card] {
        self.region_sets
            .get(&region)
            .map(|set| set.cards(card_type))
            .unwrap_or(&[])
    }

    pub fn size(&self) -> usize {
        self.code_to_card.len()
    }
}

impl std::fmt::Debug for CardCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardCatalog {{ cards: {} }}", self.code_to_card.len())
    }
}
