use moviedb_model::{Actor, CatalogSnapshot, Movie, MovieID, MovieSubmission};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    catalog::id_allocator::IdAllocator, database::CatalogStore, error::Result,
};

/// Request-level catalog operations.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    allocator: IdAllocator,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            allocator: IdAllocator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Every movie, actor and genre. The three collections are read
    /// concurrently.
    pub async fn snapshot(&self) -> Result<CatalogSnapshot> {
        let (movies, actors, genres) = tokio::try_join!(
            self.store.list_movies(),
            self.store.list_actors(),
            self.store.list_genres(),
        )?;

        debug!(
            "catalog snapshot: {} movies, {} actors, {} genres",
            movies.len(),
            actors.len(),
            genres.len()
        );

        Ok(CatalogSnapshot {
            movies,
            actors,
            genres,
        })
    }

    /// Resolve cast and genre names to ids (minting new ones as needed) and
    /// replace-or-insert the movie by `MovieID`.
    ///
    /// Actors are resolved first; if any fail, genres are not touched and the
    /// movie is not written. Records minted before a failure are kept.
    pub async fn submit_movie(
        &self,
        submission: MovieSubmission,
    ) -> Result<Movie> {
        let actor_names = submission.actor_names();
        let actors = self.allocator.resolve_actors(&actor_names).await?;

        let genre_names = submission.genre_names();
        let genres = self.allocator.resolve_genres(&genre_names).await?;

        let movie = submission.into_movie(actors, genres);
        self.store.upsert_movie(&movie).await?;

        info!(
            "Saved movie {} ({} actors, {} genres)",
            movie.id,
            movie.actors.len(),
            movie.genres.len()
        );
        Ok(movie)
    }

    pub async fn upsert_actor(&self, actor: Actor) -> Result<()> {
        self.store.upsert_actor(&actor).await?;
        info!("Saved actor {}", actor.id);
        Ok(())
    }

    /// Count one play. Returns `false` if no movie has this id.
    pub async fn record_play(&self, id: MovieID) -> Result<bool> {
        let matched = self.store.increment_movie_plays(id).await?;
        if matched {
            debug!("Recorded play for movie {}", id);
        } else {
            warn!("Play recorded for unknown movie {}", id);
        }
        Ok(matched)
    }
}
