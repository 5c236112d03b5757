use async_trait::async_trait;
use moviedb_model::{Actor, Genre, Movie, MovieID};

use crate::error::Result;

/// Repository port for the three catalog collections.
///
/// Upserts are keyed on the domain identifier (`MovieID`, `ActorID`), never on
/// the storage key. Adapters map storage failures to [`crate::CatalogError`];
/// an insert that collides with an existing identifier must surface as
/// [`crate::CatalogError::DuplicateKey`] so the allocator can retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>>;
    async fn list_actors(&self) -> Result<Vec<Actor>>;
    async fn list_genres(&self) -> Result<Vec<Genre>>;

    /// First actor whose name matches exactly.
    async fn find_actor_by_name(&self, name: &str) -> Result<Option<Actor>>;
    /// First genre whose name matches exactly.
    async fn find_genre_by_name(&self, name: &str) -> Result<Option<Genre>>;

    /// Actor with the highest identifier.
    async fn latest_actor(&self) -> Result<Option<Actor>>;
    /// Genre with the highest identifier.
    async fn latest_genre(&self) -> Result<Option<Genre>>;

    async fn insert_actor(&self, actor: &Actor) -> Result<()>;
    async fn insert_genre(&self, genre: &Genre) -> Result<()>;

    /// Replace the movie with the same identifier, or insert it.
    async fn upsert_movie(&self, movie: &Movie) -> Result<()>;
    /// Replace the actor with the same identifier, or insert it.
    async fn upsert_actor(&self, actor: &Actor) -> Result<()>;

    /// Add one to `MoviePlays`. Returns `false` when no movie matched.
    async fn increment_movie_plays(&self, id: MovieID) -> Result<bool>;
}

