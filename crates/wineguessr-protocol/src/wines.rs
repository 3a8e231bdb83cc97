//! Wine list loading.
//!
//! A wine list is a JSON array of [`Wine`] objects, as uploaded by a player
//! or bundled with the game. The core only requires a non-empty list.

use crate::{ProtocolError, Wine};

/// The bundled sample list, also offered to players as a template.
pub const SAMPLE_WINES_JSON: &str = include_str!("../data/sample-wines.json");

/// Parses a JSON wine list.
///
/// # Errors
/// Returns [`ProtocolError::InvalidWineList`] if the bytes are not a JSON
/// array of wines, or if the array is empty.
pub fn parse_wine_list(data: &[u8]) -> Result<Vec<Wine>, ProtocolError> {
    let wines: Vec<Wine> = serde_json::from_slice(data)
        .map_err(|e| ProtocolError::InvalidWineList(e.to_string()))?;
    if wines.is_empty() {
        return Err(ProtocolError::InvalidWineList("the wine list is empty".into()));
    }
    Ok(wines)
}

/// The bundled sample wines.
///
/// # Errors
/// Only fails if the embedded file is corrupt.
pub fn sample_wines() -> Result<Vec<Wine>, ProtocolError> {
    parse_wine_list(SAMPLE_WINES_JSON.as_bytes())
}
