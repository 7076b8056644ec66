//! Save envelope codec.
//!
//! A save is one storage string framed as
//! `HEADER + "Version" + <envelope version> + "-" + PAYLOAD + FOOTER`.
//! The payload is built in fixed stage order: tagged JSON, gzip, base64
//! (padding stripped), then character substitution so the text stays free
//! of `=`, `+` and `/`.
//!
//! Substitution order matters: `0` must be escaped to `0a` before `+` and
//! `/` become `0b`/`0c`, and decoding undoes `0b`, `0c`, `0a` in that
//! order. Framing is parsed by delimiters, never by fixed offsets, so the
//! version field can change width freely.
//!
//! Any malformed stage fails with [`GameError::DecodeFailed`]; callers at
//! the load boundary treat that as "no usable save".

use std::io::{Read, Write};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GameError, GameResult};

const HEADER: &str = "ModdingTreeSavefileFormatHeader";
const FOOTER: &str = "EndOfTMTSavefile";
const VERSION_MARK: &str = "Version";

/// Version of the envelope format itself, independent of the game version
/// stored inside the payload.
pub const ENVELOPE_VERSION: &str = "1.0.0";

fn decode_err(message: impl Into<String>) -> GameError {
    GameError::DecodeFailed(message.into())
}

pub fn serialize<T: Serialize>(state: &T) -> GameResult<String> {
    let json = serde_json::to_vec(state)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .and_then(|()| encoder.finish())
        .map_err(|e| GameError::Other(anyhow::Error::new(e)))
        .map(|compressed| {
            let encoded = STANDARD.encode(compressed);
            let substituted = encoded
                .trim_end_matches('=')
                .replace('0', "0a")
                .replace('+', "0b")
                .replace('/', "0c");
            format!("{HEADER}{VERSION_MARK}{ENVELOPE_VERSION}-{substituted}{FOOTER}")
        })
}

pub fn deserialize<T: DeserializeOwned>(text: &str) -> GameResult<T> {
    let body = text
        .strip_prefix(HEADER)
        .ok_or_else(|| decode_err("missing envelope header"))?;
    let body = body
        .strip_prefix(VERSION_MARK)
        .ok_or_else(|| decode_err("missing version marker"))?;
    let (version, payload) = body
        .split_once('-')
        .ok_or_else(|| decode_err("unterminated version field"))?;
    if version != ENVELOPE_VERSION {
        return Err(decode_err(format!(
            "unknown envelope version '{version}'"
        )));
    }
    let payload = payload
        .strip_suffix(FOOTER)
        .ok_or_else(|| decode_err("missing envelope footer"))?;

    let encoded = payload
        .replace("0b", "+")
        .replace("0c", "/")
        .replace("0a", "0");
    let compressed = STANDARD_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| decode_err(format!("payload is not valid base64: {e}")))?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| decode_err(format!("payload failed to decompress: {e}")))?;

    serde_json::from_slice(&json)
        .map_err(|e| decode_err(format!("payload is not a valid save: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;
    use crate::save::{NodeData, PlayerState};

    fn sample() -> PlayerState {
        let mut state =
            PlayerState::default_save("2.0-indev1", &Decimal::from(100.0), 12_345);
        let mut node = NodeData::default();
        node.unlocked = true;
        node.points = "e200000".parse().unwrap();
        node.upgrades.insert("11".to_string());
        node.upgrades.insert("12".to_string());
        state.nodes.insert("P".to_string(), node);
        state
    }

    #[test]
    fn round_trips_a_full_state() {
        let state = sample();
        let envelope = serialize(&state).unwrap();
        let back: PlayerState = deserialize(&envelope).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn envelope_is_framed_and_substitution_safe() {
        let envelope = serialize(&sample()).unwrap();
        assert!(envelope.starts_with("ModdingTreeSavefileFormatHeaderVersion1.0.0-"));
        assert!(envelope.ends_with("EndOfTMTSavefile"));
        let payload = &envelope
            [..envelope.len() - FOOTER.len()]
            [HEADER.len() + VERSION_MARK.len() + ENVELOPE_VERSION.len() + 1..];
        assert!(!payload.contains('='));
        assert!(!payload.contains('+'));
        assert!(!payload.contains('/'));
    }

    #[test]
    fn rejects_tampered_envelopes() {
        let envelope = serialize(&sample()).unwrap();

        let headerless = &envelope[1..];
        assert!(matches!(
            deserialize::<PlayerState>(headerless),
            Err(GameError::DecodeFailed(_))
        ));

        let truncated = &envelope[..envelope.len() - 1];
        assert!(matches!(
            deserialize::<PlayerState>(truncated),
            Err(GameError::DecodeFailed(_))
        ));

        let garbled = envelope.replace("0a", "0z");
        if garbled != envelope {
            assert!(deserialize::<PlayerState>(&garbled).is_err());
        }
    }

    #[test]
    fn rejects_unknown_envelope_versions() {
        let envelope = serialize(&sample()).unwrap();
        let bumped = envelope.replacen("Version1.0.0-", "Version9.0.0-", 1);
        assert!(matches!(
            deserialize::<PlayerState>(&bumped),
            Err(GameError::DecodeFailed(_))
        ));
    }
}
