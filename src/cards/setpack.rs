use std::path::Path;

use bytes::Buf;
use serde::de::DeserializeOwned;

use crate::{
    cards::{Card, CardKind, Rarity, Region},
    err,
    status::{Code, Status},
    Res,
};

const RUNETERRA: &str = "Runeterra";
const STANDARD_FORMAT_REF: &str = "client_Formats_Standard_name";

fn decode_json<T: DeserializeOwned>(bytes: bytes::Bytes) -> Res<T> {
    serde_json::de::from_reader(bytes.reader())
        .map_err(|e| Status::new(Code::InvalidSetPackFormat, e))
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SetPackAsset {
    game_absolute_path: String,
    full_absolute_path: String,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SetPackCard {
    card_code: String,
    name: String,
    cost: u32,

    /// Card text, including markup.
    #[serde(default)]
    description: String,

    /// Common, Rare, Epic, Champion or None.
    rarity_ref: String,

    #[serde(rename = "type")]
    kind: String,

    /// Region names. Runeterra champions list "Runeterra" here.
    region_refs: Vec<String>,

    #[serde(default)]
    subtypes: Vec<String>,

    #[serde(default)]
    keywords: Vec<String>,

    collectible: bool,

    #[serde(default)]
    format_refs: Vec<String>,

    #[serde(default)]
    assets: Vec<SetPackAsset>,
}

impl SetPackCard {
    fn rarity(&self) -> Option<Rarity> {
        match self.rarity_ref.as_str() {
            "Common" => Some(Rarity::Common),
            "Rare" => Some(Rarity::Rare),
            "Epic" => Some(Rarity::Epic),
            "Champion" => Some(Rarity::Champion),
            "None" => Some(Rarity::None),
            _ => None,
        }
    }

    fn kind(&self) -> Option<CardKind> {
        match self.kind.as_str() {
            "Unit" => Some(CardKind::Unit),
            "Spell" => Some(CardKind::Spell),
            "Equipment" => Some(CardKind::Equipment),
            "Landmark" => Some(CardKind::Landmark),
            "Trap" => Some(CardKind::Trap),
            "Ability" => Some(CardKind::Ability),
            _ => None,
        }
    }

    fn regions(&self) -> Option<Vec<Region>> {
        let mut regions = Vec::new();
        for region_ref in &self.region_refs {
            if region_ref == RUNETERRA {
                // Runeterra champions belong to their own origin.
                if let Some(origin) = Region::origin_of(&self.name) {
                    regions.push(origin);
                }
            } else if let Some(region) = Region::from_ref(region_ref) {
                regions.push(region);
            } else {
                tracing::warn!(
                    "Unknown region {region_ref} on card {}, skipping card.",
                    self.card_code
                );
                return None;
            }
        }
        Some(regions)
    }

    fn to_card(self) -> Option<Card> {
        if !self.collectible {
            return None;
        }

        let rarity = self.rarity()?;
        let kind = self.kind()?;
        let regions = self.regions()?;
        let is_standard = self.format_refs.iter().any(|f| f == STANDARD_FORMAT_REF);
        let asset = self.assets.into_iter().next().unwrap_or_default();

        Some(Card {
            card_code: self.card_code,
            name: self.name,
            cost: self.cost,
            rarity,
            kind,
            regions,
            subtypes: self.subtypes.iter().map(|s| s.to_lowercase()).collect(),
            keywords: self.keywords,
            description: self.description,
            image_url: asset.game_absolute_path,
            full_image_url: asset.full_absolute_path,
            is_standard,
        })
    }
}

pub fn decode_set_pack(bytes: bytes::Bytes) -> Res<Vec<Card>> {
    let cards: Vec<SetPackCard> = decode_json(bytes)?;
    Ok(cards.into_iter().filter_map(SetPackCard::to_card).collect())
}

/// Load every set pack JSON file in the data directory.
pub async fn load_cards(data: &Path) -> Res<Vec<Card>> {
    tracing::debug!("Loading set pack card data from {}.", data.display());

    let mut dir = match tokio::fs::read_dir(data).await {
        Ok(dir) => dir,
        Err(e) => return err(Code::FileReadError, format!("{}: {e}", data.display())),
    };

    let mut cards = Vec::new();
    loop {
        let entry = match dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return err(Code::FileReadError, e),
        };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => return err(Code::FileReadError, format!("{}: {e}", path.display())),
        };
        tracing::debug!("Read {} from disk. Parsing JSON.", path.display());
        let mut set_cards = decode_set_pack(bytes::Bytes::from(raw)).map_err(|e| {
            Status::new(e.code, format!("{}: {}", path.display(), e.message))
        })?;
        cards.append(&mut set_cards);
    }

    Ok(cards)
}
