//! Torrent decoding and magnet links.
//!
//! The catalog serves `.torrent` files for most entries. Rather than handing
//! those files around, the mirror resolver turns them into magnet URIs:
//! the info hash is the SHA-1 of the bencoded `info` dictionary, and the
//! display name and trackers come from the torrent itself.
//!
//! ```rust
//! use bookwyrm::torrent::Torrent;
//!
//! let bytes = b"d8:announce20:http://t.example/ann4:infod6:lengthi3e4:name5:a.pdf12:piece lengthi16384e6:pieces0:ee";
//! let torrent = Torrent::from_bytes(bytes).unwrap();
//!
//! assert_eq!(torrent.name.as_deref(), Some("a.pdf"));
//! assert!(torrent.magnet_uri().starts_with("magnet:?xt=urn:btih:"));
//! ```

use serde::Deserialize;
use serde_bencode::value::Value;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct MetaInfo {
    info: Value,
    #[serde(default)]
    announce: Option<String>,
    #[serde(default, rename = "announce-list")]
    announce_list: Option<Vec<Vec<String>>>,
}

/// The parts of a torrent needed for a magnet link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Torrent {
    /// Lower-case hex SHA-1 of the bencoded `info` dictionary
    pub info_hash: String,
    pub name: Option<String>,
    /// Tracker URLs, `announce` first, then `announce-list` tiers in order,
    /// without duplicates
    pub trackers: Vec<String>,
    /// Total length for single-file torrents
    pub length: Option<u64>,
}

impl Torrent {
    /// Decodes a bencoded torrent file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let meta: MetaInfo = serde_bencode::from_bytes(bytes)
            .map_err(|e| Error::torrent(format!("invalid bencode: {}", e)))?;

        let Value::Dict(ref info) = meta.info else {
            return Err(Error::torrent("'info' is not a dictionary"));
        };

        let encoded_info = serde_bencode::to_bytes(&meta.info)
            .map_err(|e| Error::torrent(format!("cannot re-encode info: {}", e)))?;
        let info_hash = sha1_smol::Sha1::from(&encoded_info).digest().to_string();

        let name = match info.get(b"name".as_slice()) {
            Some(Value::Bytes(name)) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        };
        let length = match info.get(b"length".as_slice()) {
            Some(Value::Int(length)) => u64::try_from(*length).ok(),
            _ => None,
        };

        let mut trackers: Vec<String> = Vec::new();
        let tiers = meta.announce_list.unwrap_or_default();
        for tracker in meta.announce.into_iter().chain(tiers.into_iter().flatten()) {
            if !tracker.is_empty() && !trackers.contains(&tracker) {
                trackers.push(tracker);
            }
        }

        Ok(Self {
            info_hash,
            name,
            trackers,
            length,
        })
    }

    /// Builds `magnet:?xt=urn:btih:<hash>&dn=<name>&tr=<tracker>...`.
    pub fn magnet_uri(&self) -> String {
        let mut uri = format!("magnet:?xt=urn:btih:{}", self.info_hash);
        if let Some(name) = &self.name {
            uri.push_str("&dn=");
            uri.push_str(&urlencoding::encode(name));
        }
        for tracker in &self.trackers {
            uri.push_str("&tr=");
            uri.push_str(&urlencoding::encode(tracker));
        }
        uri
    }
}

/// Decodes a torrent file straight into its magnet URI.
pub fn magnet_from_torrent(bytes: &[u8]) -> Result<String> {
    Torrent::from_bytes(bytes).map(|torrent| torrent.magnet_uri())
}
