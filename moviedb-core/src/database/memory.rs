use async_trait::async_trait;
use moviedb_model::{Actor, Genre, Movie, MovieID};
use tokio::sync::RwLock;

use crate::{
    database::ports::CatalogStore,
    error::{CatalogError, Result},
};

/// Process-local catalog with the same upsert and uniqueness rules as the
/// MongoDB adapter. Used by tests and `--in-memory` runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    movies: RwLock<Vec<Movie>>,
    actors: RwLock<Vec<Actor>>,
    genres: RwLock<Vec<Genre>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(
        movies: Vec<Movie>,
        actors: Vec<Actor>,
        genres: Vec<Genre>,
    ) -> Self {
        Self {
            movies: RwLock::new(movies),
            actors: RwLock::new(actors),
            genres: RwLock::new(genres),
        }
    }

    pub async fn movie(&self, id: MovieID) -> Option<Movie> {
        self.movies
            .read()
            .await
            .iter()
            .find(|movie| movie.id == id)
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.movies.read().await.clone())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        Ok(self.actors.read().await.clone())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        Ok(self.genres.read().await.clone())
    }

    async fn find_actor_by_name(&self, name: &str) -> Result<Option<Actor>> {
        Ok(self
            .actors
            .read()
            .await
            .iter()
            .find(|actor| actor.name.as_deref() == Some(name))
            .cloned())
    }

    async fn find_genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self
            .genres
            .read()
            .await
            .iter()
            .find(|genre| genre.name.as_deref() == Some(name))
            .cloned())
    }

    async fn latest_actor(&self) -> Result<Option<Actor>> {
        Ok(self
            .actors
            .read()
            .await
            .iter()
            .max_by_key(|actor| actor.id)
            .cloned())
    }

    async fn latest_genre(&self) -> Result<Option<Genre>> {
        Ok(self
            .genres
            .read()
            .await
            .iter()
            .max_by_key(|genre| genre.id)
            .cloned())
    }

    async fn insert_actor(&self, actor: &Actor) -> Result<()> {
        let mut actors = self.actors.write().await;
        if actors.iter().any(|existing| existing.id == actor.id) {
            return Err(CatalogError::DuplicateKey(format!(
                "ActorID {}",
                actor.id
            )));
        }
        actors.push(actor.clone());
        Ok(())
    }

    async fn insert_genre(&self, genre: &Genre) -> Result<()> {
        let mut genres = self.genres.write().await;
        if genres.iter().any(|existing| existing.id == genre.id) {
            return Err(CatalogError::DuplicateKey(format!(
                "GenreID {}",
                genre.id
            )));
        }
        genres.push(genre.clone());
        Ok(())
    }

    async fn upsert_movie(&self, movie: &Movie) -> Result<()> {
        let mut movies = self.movies.write().await;
        match movies.iter_mut().find(|existing| existing.id == movie.id) {
            Some(existing) => *existing = movie.clone(),
            None => movies.push(movie.clone()),
        }
        Ok(())
    }

    async fn upsert_actor(&self, actor: &Actor) -> Result<()> {
        let mut actors = self.actors.write().await;
        match actors.iter_mut().find(|existing| existing.id == actor.id) {
            Some(existing) => *existing = actor.clone(),
            None => actors.push(actor.clone()),
        }
        Ok(())
    }

    async fn increment_movie_plays(&self, id: MovieID) -> Result<bool> {
        let mut movies = self.movies.write().await;
        let Some(movie) = movies.iter_mut().find(|movie| movie.id == id) else {
            return Ok(false);
        };
        movie.plays = Some(movie.plays.unwrap_or(0) + 1);
        Ok(true)
    }
}
