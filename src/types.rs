use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a movie. The engine relies on ascending order of these ids.
pub type MovieId = i64;

/// Cluster label assigned by the cluster assigner.
pub type ClusterLabel = u32;

/// A dense weighted-term vector, positionally aligned with the catalog order it was built from.
pub type FeatureVector = Vec<f64>;

/// An `{id, name}` pair, used for genres and keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: i64,
    pub name: String,
}

/// A billed cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    /// On-screen billing order, lower is more prominent.
    #[serde(default)]
    pub order: i32,
}

/// A crew credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// A full movie record as held by the catalog and returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Tag>,
    #[serde(default)]
    pub keywords: Vec<Tag>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    /// Items that are not displayable are excluded from feature builds and lookups.
    #[serde(default = "default_displayable")]
    pub displayable: bool,
}

fn default_displayable() -> bool {
    true
}

impl Movie {
    /// Minimal record with only an id and a title.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            original_title: None,
            overview: String::new(),
            release_date: None,
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0.0,
            poster_path: None,
            genres: Vec::new(),
            keywords: Vec::new(),
            cast: Vec::new(),
            crew: Vec::new(),
            displayable: true,
        }
    }
}

/// The read-only projection of a catalog record that feature extraction consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: MovieId,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub keywords: Vec<Tag>,
    pub genres: Vec<Tag>,
    pub overview: String,
}

impl From<&Movie> for CatalogItem {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            cast: movie.cast.clone(),
            crew: movie.crew.clone(),
            keywords: movie.keywords.clone(),
            genres: movie.genres.clone(),
            overview: movie.overview.clone(),
        }
    }
}

/// One persisted row of the similarity matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub row_index: usize,
    pub scores: Vec<f64>,
}

/// Where a recommendation result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Co-members of the queried movie's cluster.
    Cluster,
    /// Ranked similarity row.
    Similarity,
    /// No similarity or cluster data was available.
    Empty,
}

impl std::fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationSource::Cluster => write!(f, "cluster"),
            RecommendationSource::Similarity => write!(f, "similarity"),
            RecommendationSource::Empty => write!(f, "empty"),
        }
    }
}
