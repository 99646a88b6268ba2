//! Ranking and Qualification
//!
//! Pure computations over already-loaded collections: time ranking for
//! timed events, per-school score tables, and qualifier grouping. Callers
//! persist the results through `db::participants`.

pub mod qualifiers;
pub mod scores;
pub mod timing;

pub use qualifiers::{qualified_by_game, select_top_finishers, QualifiedEntry, QualifiedGroup};
pub use scores::{aggregate_scores, TeamScore};
pub use timing::rank_by_time;

use crate::db::models::{CompetitionLevel, Game, Gender, SchoolLevel};
use serde::{
    de::{value::StrDeserializer, DeserializeOwned, IntoDeserializer},
    Deserialize, Deserializer,
};

/// Result filters shared by the rankings and qualified views. Query values of
/// `all` or empty strings mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultFilter {
    #[serde(default, deserialize_with = "optional_filter")]
    pub level: Option<CompetitionLevel>,
    #[serde(default, deserialize_with = "optional_filter")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "optional_filter")]
    pub school_level: Option<SchoolLevel>,
    /// Case-insensitive substring over the school's name and location fields.
    #[serde(default)]
    pub location: Option<String>,
}

impl ResultFilter {
    pub fn admits_game(&self, game: &Game) -> bool {
        self.level.map_or(true, |l| game.level == l)
            && self.gender.map_or(true, |g| game.gender == g)
            && self.school_level.map_or(true, |s| game.school_level == s)
    }

    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

/// Deserialize an optional enum query value, treating `all` or empty as absent.
pub fn optional_filter<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => {
            let de: StrDeserializer<D::Error> = value.into_deserializer();
            T::deserialize(de).map(Some)
        }
    }
}
