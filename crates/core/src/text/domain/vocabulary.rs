use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::special_tokens::TokenId;
use crate::shared::error::TokenizerError;

/// Bidirectional token string <-> id table, read-only once loaded.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    token_to_id: HashMap<String, TokenId>,
    id_to_token: HashMap<TokenId, String>,
}

impl Vocabulary {
    pub fn from_map(token_to_id: HashMap<String, TokenId>) -> Self {
        let id_to_token = token_to_id
            .iter()
            .map(|(token, &id)| (id, token.clone()))
            .collect();
        Self {
            token_to_id,
            id_to_token,
        }
    }

    /// Load a `vocab.json` string-to-id map. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self, TokenizerError> {
        if !path.exists() {
            log::warn!("Vocabulary not found at {}; using empty table", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|e| TokenizerError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let map: HashMap<String, TokenId> =
            serde_json::from_str(&json).map_err(|e| TokenizerError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        log::debug!("Loaded {} vocabulary entries from {}", map.len(), path.display());
        Ok(Self::from_map(map))
    }

    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }
}

pub type MergePair = (String, String);

/// Load BPE merge pairs from `merges.txt`. The first line is a header.
///
/// A missing file yields no merges; lines with fewer than two fields are skipped.
pub fn load_merges(path: &Path) -> Result<Vec<MergePair>, TokenizerError> {
    if !path.exists() {
        log::warn!("Merges not found at {}; using empty table", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|e| TokenizerError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_merges(&text))
}

fn parse_merges(text: &str) -> Vec<MergePair> {
    text.trim()
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(a), Some(b)) => Some((a.to_string(), b.to_string())),
                _ => None,
            }
        })
        .collect()
}
