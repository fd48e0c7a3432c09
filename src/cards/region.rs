use super::Card;

/// Deck building regions. The first ten are printed on cards, the remainder
/// are origins, champion specific regions whose membership is decided by a
/// predicate over the card.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Region {
    Demacia,
    Noxus,
    Shurima,
    PiltoverZaun,
    Freljord,
    Targon,
    ShadowIsles,
    BandleCity,
    Bilgewater,
    Ionia,

    Evelynn,
    Bard,
    Jhin,
    Jax,
    Ryze,
    Kayn,
    Aatrox,
    Varus,
}

// Burst and focus speed spells which do not name Ryze in their text.
#[rustfmt::skip]
const RYZE_ORIGIN: &[&str] = &[
    "01DE019", "01DE017", "01DE027", "02DE007", "04DE012", "06DE042",
    "06DE030", "06DE026", "06DE040", "01NX039", "04NX002", "06NX037",
    "04SH035", "04SH120", "04SH099", "04SH037", "04SH083", "04SH092",
    "04SH110", "04SH106", "05SH018", "05SH020", "06SH048", "06SH042",
    "06SH050", "06SH049", "01PZ028", "01PZ010", "01PZ049", "01PZ016",
    "02PZ009", "03PZ014", "03PZ025", "04PZ007", "05PZ010", "05PZ030",
    "06PZ032", "06PZ043", "06PZ027", "06PZ006", "06PZ022", "01FR029",
    "01FR016", "01FR012", "02FR010", "02FR003", "03FR018", "03FR019",
    "04FR017", "04FR010", "05FR016", "06FR034", "06FR032", "03MT015",
    "03MT042", "03MT091", "03MT017", "03MT215", "03MT003", "03MT218",
    "04MT006", "04MT015", "06MT045", "06MT043", "02SI005", "02SI009",
    "03SI004", "03SI014", "03SI007", "03SI013", "06SI037", "06SI030",
    "05BC223", "05BC026", "05BC218", "05BC217", "05BC040", "06BC045",
    "06BC040", "06BC043", "06BC017", "06BC011", "06BC032", "02BW023",
    "02BW029", "02BW049", "02BW020", "02BW044", "04BW014", "04BW008",
    "04BW004", "06BW030", "06BW037", "06BW041", "06BW043", "06BW039",
    "01IO029", "01IO054", "02IO009", "05IO006", "06IO036",
];

impl Region {
    pub const MAIN: [Region; 10] = [
        Region::Demacia,
        Region::Noxus,
        Region::Shurima,
        Region::PiltoverZaun,
        Region::Freljord,
        Region::Targon,
        Region::ShadowIsles,
        Region::BandleCity,
        Region::Bilgewater,
        Region::Ionia,
    ];

    pub const ORIGINS: [Region; 8] = [
        Region::Evelynn,
        Region::Bard,
        Region::Jhin,
        Region::Jax,
        Region::Ryze,
        Region::Kayn,
        Region::Aatrox,
        Region::Varus,
    ];

    pub const ALL: [Region; 18] = [
        Region::Demacia,
        Region::Noxus,
        Region::Shurima,
        Region::PiltoverZaun,
        Region::Freljord,
        Region::Targon,
        Region::ShadowIsles,
        Region::BandleCity,
        Region::Bilgewater,
        Region::Ionia,
        Region::Evelynn,
        Region::Bard,
        Region::Jhin,
        Region::Jax,
        Region::Ryze,
        Region::Kayn,
        Region::Aatrox,
        Region::Varus,
    ];

    pub fn is_main(self) -> bool {
        Self::MAIN.contains(&self)
    }

    /// Parse a region reference as it appears in set pack data.
    pub fn from_ref(name: &str) -> Option<Region> {
        Self::ALL
            .iter()
            .find(|region| region.is_main() && region.name() == name)
            .copied()
    }

    /// The origin region belonging to the named Runeterra champion, if any.
    pub fn origin_of(champion: &str) -> Option<Region> {
        Self::ORIGINS
            .iter()
            .find(|region| region.name() == champion)
            .copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Demacia => "Demacia",
            Region::Noxus => "Noxus",
            Region::Shurima => "Shurima",
            Region::PiltoverZaun => "PiltoverZaun",
            Region::Freljord => "Freljord",
            Region::Targon => "Targon",
            Region::ShadowIsles => "ShadowIsles",
            Region::BandleCity => "BandleCity",
            Region::Bilgewater => "Bilgewater",
            Region::Ionia => "Ionia",
            Region::Evelynn => "Evelynn",
            Region::Bard => "Bard",
            Region::Jhin => "Jhin",
            Region::Jax => "Jax",
            Region::Ryze => "Ryze",
            Region::Kayn => "Kayn",
            Region::Aatrox => "Aatrox",
            Region::Varus => "Varus",
        }
    }

    /// Check whether a card may be played in a deck of this region.
    pub fn contains(self, card: &Card) -> bool {
        let follower = !card.is_champion();
        let code = card.card_code.as_str();
        let desc = card.description.as_str();
        let has_subtype = |subtype: &str| card.subtypes.iter().any(|s| s == subtype);

        match self {
            Region::Evelynn => (desc.contains("husk") && follower) || code == "06RU025",
            Region::Bard => (desc.contains("link=card.chime") && follower) || code == "06RU001",
            Region::Jhin => {
                ((desc.contains("attackskill") || desc.contains("playskill")) && follower)
                    || code == "06RU002"
            }
            Region::Jax => (has_subtype("weaponmaster") && follower) || code == "06RU008",
            Region::Ryze => RYZE_ORIGIN.contains(&code) || code == "06RU006",
            Region::Kayn => (has_subtype("cultist") && follower) || code == "06RU005",
            Region::Aatrox => (has_subtype("darkin") && follower) || code == "06RU026",
            Region::Varus => (has_subtype("cultist") && follower) || code == "06RU009",
            main => card.regions.contains(&main),
        }
    }
}
