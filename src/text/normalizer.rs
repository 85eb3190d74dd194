use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::FeatureConfig;
use crate::types::{CastMember, CatalogItem, CrewMember, Tag};

use super::stopwords::StopWords;

const DIRECTOR_JOB: &str = "Director";

/// Label prefixes, one per structured group.
pub const CREW_PREFIX: &str = "Crew";
pub const CAST_PREFIX: &str = "Cast";
pub const KEYWORD_PREFIX: &str = "Kw";
pub const GENRE_PREFIX: &str = "Gen";

/// Turns a catalog item into the flat token sequence the vectorizer consumes.
///
/// Token order is: director labels, cast labels, keyword labels, genre labels, then
/// stemmed overview tokens. One case policy applies to all of them.
pub struct TextNormalizer {
    lowercase: bool,
    labels_per_group: usize,
    stop_words: StopWords,
    stemmer: Stemmer,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("lowercase", &self.lowercase)
            .field("labels_per_group", &self.labels_per_group)
            .finish()
    }
}

impl TextNormalizer {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            lowercase: config.lowercase,
            labels_per_group: config.labels_per_group,
            stop_words: StopWords::english(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Full token sequence for one item.
    pub fn tokens(&self, item: &CatalogItem) -> Vec<String> {
        let mut tokens = self.director_labels(&item.crew);
        tokens.extend(self.cast_labels(&item.cast));
        tokens.extend(self.tag_labels(KEYWORD_PREFIX, &item.keywords));
        tokens.extend(self.tag_labels(GENRE_PREFIX, &item.genres));
        tokens.extend(self.overview_tokens(&item.overview));
        tokens
    }

    /// Directors in credit order.
    pub fn director_labels(&self, crew: &[CrewMember]) -> Vec<String> {
        crew.iter()
            .filter(|c| c.job.eq_ignore_ascii_case(DIRECTOR_JOB))
            .take(self.labels_per_group)
            .map(|c| self.label(CREW_PREFIX, &c.name))
            .collect()
    }

    /// Top-billed cast. The sort is stable, so equal billing keeps input order.
    pub fn cast_labels(&self, cast: &[CastMember]) -> Vec<String> {
        let mut billed: Vec<&CastMember> = cast.iter().collect();
        billed.sort_by_key(|c| c.order);
        billed
            .into_iter()
            .take(self.labels_per_group)
            .map(|c| self.label(CAST_PREFIX, &c.name))
            .collect()
    }

    /// Leading tags in given order.
    pub fn tag_labels(&self, prefix: &str, tags: &[Tag]) -> Vec<String> {
        tags.iter()
            .take(self.labels_per_group)
            .map(|t| self.label(prefix, &t.name))
            .collect()
    }

    /// Stop words removed, split on word boundaries, stemmed.
    pub fn overview_tokens(&self, overview: &str) -> Vec<String> {
        overview
            .unicode_words()
            .filter(|w| !self.stop_words.contains(w))
            .map(|w| {
                if self.lowercase {
                    self.stemmer.stem(&w.to_lowercase()).into_owned()
                } else {
                    self.stemmer.stem(w).into_owned()
                }
            })
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// `prefix` followed by `name` with all whitespace removed.
    pub fn label(&self, prefix: &str, name: &str) -> String {
        let label: String = prefix
            .chars()
            .chain(name.chars().filter(|c| !c.is_whitespace()))
            .collect();
        if self.lowercase {
            label.to_lowercase()
        } else {
            label
        }
    }
}
