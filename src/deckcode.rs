//! Legends of Runeterra deck codes: varint encoded card groups, base32 encoded
//! without padding.

use std::collections::BTreeMap;

use data_encoding::BASE32_NOPAD;
use integer_encoding::VarInt;

use crate::{
    err,
    status::{Code, Status},
    Res,
};

const FORMAT: u8 = 1;

/// (faction, id, minimum deck code version supporting the faction)
const FACTIONS: &[(&str, u32, u8)] = &[
    ("DE", 0, 1),
    ("FR", 1, 1),
    ("IO", 2, 1),
    ("NX", 3, 1),
    ("PZ", 4, 1),
    ("SI", 5, 1),
    ("BW", 6, 2),
    ("SH", 7, 3),
    ("MT", 9, 2),
    ("BC", 10, 4),
    ("RU", 12, 5),
];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct CardCode {
    set: u32,
    faction: u32,
    number: u32,
    code: String,
}

fn faction_id(faction: &str) -> Option<(u32, u8)> {
    FACTIONS
        .iter()
        .find(|(name, _, _)| *name == faction)
        .map(|(_, id, version)| (*id, *version))
}

fn faction_name(id: u32) -> Option<&'static str> {
    FACTIONS
        .iter()
        .find(|(_, faction_id, _)| *faction_id == id)
        .map(|(name, _, _)| *name)
}

fn parse_card_code(code: &str) -> Res<(CardCode, u8)> {
    let invalid = || Status::new(Code::InvalidDeckCode, format!("Invalid card code: {code}"));

    if !code.is_ascii() || code.len() < 5 {
        return Err(invalid());
    }
    let set = code[..2].parse::<u32>().map_err(|_| invalid())?;
    let (faction, version) = faction_id(&code[2..4]).ok_or_else(invalid)?;
    let number = code[4..].parse::<u32>().map_err(|_| invalid())?;

    Ok((
        CardCode {
            set,
            faction,
            number,
            code: code.to_string(),
        },
        version,
    ))
}

fn write_varint(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend(value.encode_var_vec());
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> Res<u32> {
    match u32::decode_var(&bytes[*pos..]) {
        Some((value, len)) => {
            *pos += len;
            Ok(value)
        }
        None => err(Code::InvalidDeckCode, "Deck code ended unexpectedly."),
    }
}

fn base32_decode(code: &str) -> Res<Vec<u8>> {
    BASE32_NOPAD
        .decode(code.trim_end_matches('=').to_ascii_uppercase().as_bytes())
        .map_err(|e| Status::new(Code::InvalidDeckCode, format!("Invalid deck code: {e}")))
}

/// Group cards by set and faction. Groups are ordered by size, then by the
/// code of their first card; cards within a group by code.
fn grouped(cards: Vec<CardCode>) -> Vec<Vec<CardCode>> {
    let mut groups: BTreeMap<(u32, u32), Vec<CardCode>> = BTreeMap::new();
    for card in cards {
        groups.entry((card.set, card.faction)).or_default().push(card);
    }

    let mut groups: Vec<Vec<CardCode>> = groups.into_values().collect();
    for group in groups.iter_mut() {
        group.sort_by(|a, b| a.code.cmp(&b.code));
    }
    groups.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a[0].code.cmp(&b[0].code)));
    groups
}

/// Encode a list of (card code, count) pairs as a deck code.
pub fn encode(cards: &[(&str, u32)]) -> Res<String> {
    let mut version = 1;
    let mut of = [Vec::new(), Vec::new(), Vec::new()];
    let mut of_n = Vec::new();
    for (code, count) in cards {
        let (card, card_version) = parse_card_code(code)?;
        version = version.max(card_version);
        match count {
            0 => {}
            1..=3 => of[*count as usize - 1].push(card),
            _ => of_n.push((card, *count)),
        }
    }

    let mut bytes = vec![FORMAT << 4 | version];
    for cards in of.into_iter().rev() {
        let groups = grouped(cards);
        write_varint(&mut bytes, groups.len() as u32);
        for group in groups {
            write_varint(&mut bytes, group.len() as u32);
            write_varint(&mut bytes, group[0].set);
            write_varint(&mut bytes, group[0].faction);
            for card in group {
                write_varint(&mut bytes, card.number);
            }
        }
    }

    of_n.sort_by(|a, b| a.0.code.cmp(&b.0.code));
    for (card, count) in of_n {
        write_varint(&mut bytes, count);
        write_varint(&mut bytes, card.set);
        write_varint(&mut bytes, card.faction);
        write_varint(&mut bytes, card.number);
    }

    Ok(BASE32_NOPAD.encode(&bytes))
}

fn card_code(set: u32, faction: u32, number: u32) -> Res<String> {
    match faction_name(faction) {
        Some(name) => Ok(format!("{set:02}{name}{number:03}")),
        None => err(Code::InvalidDeckCode, format!("Unknown faction id {faction}.")),
    }
}

/// Decode a deck code into (card code, count) pairs.
pub fn decode(code: &str) -> Res<Vec<(String, u32)>> {
    let bytes = base32_decode(code)?;
    let Some(&first) = bytes.first() else {
        return err(Code::InvalidDeckCode, "Empty deck code.");
    };
    if first >> 4 != FORMAT {
        return err(Code::InvalidDeckCode, format!("Unknown deck code format {}.", first >> 4));
    }

    let mut pos = 1;
    let mut cards = Vec::new();
    for count in (1..=3).rev() {
        let num_groups = read_varint(&bytes, &mut pos)?;
        for _ in 0..num_groups {
            let group_len = read_varint(&bytes, &mut pos)?;
            let set = read_varint(&bytes, &mut pos)?;
            let faction = read_varint(&bytes, &mut pos)?;
            for _ in 0..group_len {
                let number = read_varint(&bytes, &mut pos)?;
                cards.push((card_code(set, faction, number)?, count));
            }
        }
    }

    while pos < bytes.len() {
        let count = read_varint(&bytes, &mut pos)?;
        let set = read_varint(&bytes, &mut pos)?;
        let faction = read_varint(&bytes, &mut pos)?;
        let number = read_varint(&bytes, &mut pos)?;
        cards.push((card_code(set, faction, number)?, count));
    }

    Ok(cards)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_varint() {
        let mut bytes = Vec::new();
        write_varint(&mut bytes, 5);
        write_varint(&mut bytes, 300);
        assert_eq!(bytes, vec![0x05, 0xac, 0x02]);

        let mut pos = 0;
        assert_eq!(read_varint(&bytes, &mut pos).unwrap(), 5);
        assert_eq!(read_varint(&bytes, &mut pos).unwrap(), 300);
        assert!(read_varint(&bytes, &mut pos).is_err());
    }

    #[test]
    fn test_base32() {
        assert_eq!(base32_decode("MZXW6YTBOI======").unwrap(), b"foobar");
        assert_eq!(base32_decode("mzxw6ytboi").unwrap(), b"foobar");
        assert!(base32_decode("MZ1W").is_err());
    }

    #[test]
    fn test_encode() {
        // One copy of 01DE001 only: version 1, no threes, no twos, one group
        // of one card in set 1, faction 0.
        let code = encode(&[("01DE001", 1)]).unwrap();
        assert_eq!(base32_decode(&code).unwrap(), vec![0x11, 0, 0, 1, 1, 1, 0, 1]);
    }

    #[test]
    fn test_version() {
        let code = encode(&[("01DE001", 3), ("06RU008", 1)]).unwrap();
        assert_eq!(base32_decode(&code).unwrap()[0], 0x15);
        let code = encode(&[("01DE001", 3), ("02BW010", 1)]).unwrap();
        assert_eq!(base32_decode(&code).unwrap()[0], 0x12);
    }

    #[test]
    fn test_decode_deck() {
        let deck = [
            ("01DE002", 3),
            ("01DE012", 3),
            ("01NX020", 2),
            ("02NX004", 1),
            ("01DE001", 3),
            ("05BC040", 2),
            ("06RU008", 5),
        ];
        let code = encode(&deck).unwrap();

        let mut decoded = decode(&code).unwrap();
        decoded.sort();
        let mut expected: Vec<(String, u32)> =
            deck.iter().map(|(c, n)| (c.to_string(), *n)).collect();
        expected.sort();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_invalid_card_codes() {
        for code in ["", "01XX001", "AADE001", "01DE", "01DEabc"] {
            assert_eq!(
                encode(&[(code, 1)]).unwrap_err().code,
                Code::InvalidDeckCode,
                "{code}"
            );
        }
        assert!(decode("").is_err());
    }
}
