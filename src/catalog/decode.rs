//! Decoding of catalog rows into structured records.
//!
//! Catalog exports carry credits, keywords and genres either as JSON arrays or as
//! JSON-encoded strings inside a text column. Both shapes are decoded here, once, so
//! the rest of the engine only sees `Tag`, `CastMember` and `CrewMember` values.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MarqueeError, Result};
use crate::types::{CastMember, CrewMember, Movie, MovieId, Tag};

/// A catalog row as found in an export file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMovieRow {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Value,
    #[serde(default)]
    pub keywords: Value,
    #[serde(default)]
    pub cast: Value,
    #[serde(default)]
    pub crew: Value,
    #[serde(default)]
    pub displayable: Option<bool>,
}

impl RawMovieRow {
    pub fn decode(self) -> Result<Movie> {
        let id = self.id;
        Ok(Movie {
            id,
            title: self.title,
            original_title: self.original_title,
            overview: self.overview.unwrap_or_default(),
            release_date: self.release_date,
            popularity: self.popularity.unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or_default(),
            vote_count: self.vote_count.unwrap_or_default(),
            poster_path: self.poster_path,
            genres: decode_field::<Tag>(id, "genres", self.genres)?,
            keywords: decode_field::<Tag>(id, "keywords", self.keywords)?,
            cast: decode_field::<CastMember>(id, "cast", self.cast)?,
            crew: decode_field::<CrewMember>(id, "crew", self.crew)?,
            displayable: self.displayable.unwrap_or(true),
        })
    }
}

/// Decode one structured field. Null, absent and blank values decode to an empty list.
pub fn decode_field<T: DeserializeOwned>(
    movie_id: MovieId,
    field: &str,
    value: Value,
) -> Result<Vec<T>> {
    let malformed = |reason: String| MarqueeError::MalformedFeatureData {
        movie_id,
        reason: format!("{field}: {reason}"),
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(encoded) if encoded.trim().is_empty() => Ok(Vec::new()),
        Value::String(encoded) => {
            serde_json::from_str(&encoded).map_err(|e| malformed(e.to_string()))
        }
        array @ Value::Array(_) => {
            serde_json::from_value(array).map_err(|e| malformed(e.to_string()))
        }
        other => Err(malformed(format!("expected a list, found {other}"))),
    }
}

/// Decode a JSON array of rows.
pub fn decode_rows(data: &[u8]) -> Result<Vec<Movie>> {
    let rows: Vec<RawMovieRow> = serde_json::from_slice(data)?;
    rows.into_iter().map(RawMovieRow::decode).collect()
}
