//! Catalog records as they are stored and exchanged over HTTP.
//!
//! Field names keep the existing PascalCase document layout (`MovieID`,
//! `ActorName`, ...) so existing collections deserialize unchanged. Optional
//! fields are omitted when absent, which makes a full-document replace drop
//! anything the new body leaves out.
//!
//! Older documents can hold actor or genre names in `MovieActors` and
//! `MovieGenres` where an id was never written back. Those entries are
//! skipped on read.

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use tracing::warn;

use crate::ids::{ActorID, GenreID, MovieID};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "MovieID")]
    pub id: MovieID,
    #[serde(
        rename = "MovieName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        rename = "MovieCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
    #[serde(
        rename = "MovieYear",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,
    #[serde(
        rename = "MovieAdded",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub added: Option<String>,
    #[serde(rename = "MovieLocation", default)]
    pub locations: Vec<String>,
    #[serde(
        rename = "MovieImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    #[serde(
        rename = "MovieThumbnail",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<String>,
    #[serde(
        rename = "MoviePlays",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub plays: Option<i64>,
    #[serde(
        rename = "MovieGenres",
        default,
        deserialize_with = "lenient_ids"
    )]
    pub genres: Vec<GenreID>,
    #[serde(
        rename = "MovieActors",
        default,
        deserialize_with = "lenient_ids"
    )]
    pub actors: Vec<ActorID>,
    #[serde(
        rename = "MovieStudio",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub studio: Option<String>,
}

impl Movie {
    /// A movie with only its identifier set.
    pub fn new(id: MovieID) -> Self {
        Self {
            id,
            name: None,
            code: None,
            year: None,
            added: None,
            locations: Vec::new(),
            image: None,
            thumbnail: None,
            plays: None,
            genres: Vec::new(),
            actors: Vec::new(),
            studio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "ActorID")]
    pub id: ActorID,
    #[serde(
        rename = "ActorName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        rename = "ActorBirthday",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub birthday: Option<String>,
    #[serde(
        rename = "ActorAdded",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub added: Option<String>,
    #[serde(
        rename = "ActorImage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

impl Actor {
    pub fn named(id: ActorID, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            birthday: None,
            added: None,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "GenreID")]
    pub id: GenreID,
    #[serde(
        rename = "GenreName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl Genre {
    pub fn named(id: GenreID, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// Body of `POST /movie`.
///
/// Identical to [`Movie`] except that cast and genres arrive as
/// comma-separated names which the server resolves to identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSubmission {
    #[serde(rename = "MovieID")]
    pub id: MovieID,
    #[serde(rename = "MovieName", default)]
    pub name: Option<String>,
    #[serde(rename = "MovieCode", default)]
    pub code: Option<String>,
    #[serde(rename = "MovieYear", default)]
    pub year: Option<i32>,
    #[serde(rename = "MovieAdded", default)]
    pub added: Option<String>,
    #[serde(rename = "MovieLocation", default)]
    pub locations: Vec<String>,
    #[serde(rename = "MovieImage", default)]
    pub image: Option<String>,
    #[serde(rename = "MovieThumbnail", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "MoviePlays", default)]
    pub plays: Option<i64>,
    #[serde(rename = "MovieGenres", default)]
    pub genres: String,
    #[serde(rename = "MovieActors", default)]
    pub actors: String,
    #[serde(rename = "MovieStudio", default)]
    pub studio: Option<String>,
}

impl MovieSubmission {
    pub fn actor_names(&self) -> Vec<&str> {
        split_names(&self.actors)
    }

    pub fn genre_names(&self) -> Vec<&str> {
        split_names(&self.genres)
    }

    /// Build the stored document once names have been resolved.
    pub fn into_movie(
        self,
        actors: Vec<ActorID>,
        genres: Vec<GenreID>,
    ) -> Movie {
        Movie {
            id: self.id,
            name: self.name,
            code: self.code,
            year: self.year,
            added: self.added,
            locations: self.locations,
            image: self.image,
            thumbnail: self.thumbnail,
            plays: self.plays,
            genres,
            actors,
            studio: self.studio,
        }
    }
}

/// Body of `POST /play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRequest {
    #[serde(rename = "MovieID")]
    pub movie_id: MovieID,
}

/// Response of `GET /`: every record in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub movies: Vec<Movie>,
    pub actors: Vec<Actor>,
    pub genres: Vec<Genre>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdEntry<T> {
    Id(T),
    Other(IgnoredAny),
}

/// Keep the numeric entries of a stored id list; null reads as empty.
fn lenient_ids<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<Vec<IdEntry<T>>>::deserialize(deserializer)?
        .unwrap_or_default();
    let total = entries.len();
    let ids: Vec<T> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            IdEntry::Id(id) => Some(id),
            IdEntry::Other(_) => None,
        })
        .collect();

    if ids.len() < total {
        warn!("Skipped {} unresolved entries in a movie", total - ids.len());
    }
    Ok(ids)
}

/// Split a comma-separated name list, trimming whitespace and dropping empty
/// entries.
pub fn split_names(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
