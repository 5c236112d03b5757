use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use moviedb_model::{Actor, Genre, Movie, MovieID};
use std::fmt;
use tracing::{debug, info, warn};

use crate::{
    database::ports::CatalogStore,
    error::{CatalogError, Result},
};

const DUPLICATE_KEY_CODE: i32 = 11000;

pub const MOVIES_COLLECTION: &str = "movies";
pub const ACTORS_COLLECTION: &str = "actors";
pub const GENRES_COLLECTION: &str = "genres";

/// MongoDB-backed catalog.
#[derive(Clone)]
pub struct MongoCatalogStore {
    client: Client,
    database: Database,
    movies: Collection<Movie>,
    actors: Collection<Actor>,
    genres: Collection<Genre>,
}

impl fmt::Debug for MongoCatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoCatalogStore")
            .field("database", &self.database.name())
            .finish_non_exhaustive()
    }
}

impl MongoCatalogStore {
    /// Connect and verify the server answers a ping.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self::from_client(client, database);

        store.database.run_command(doc! { "ping": 1 }).await?;
        info!(
            "Database connection established successfully ({})",
            database
        );

        Ok(store)
    }

    pub fn from_client(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self {
            movies: database.collection(MOVIES_COLLECTION),
            actors: database.collection(ACTORS_COLLECTION),
            genres: database.collection(GENRES_COLLECTION),
            database,
            client,
        }
    }

    /// Create the lookup indexes. `ActorID`/`GenreID` are unique so a racing
    /// allocation in another process fails with a duplicate key instead of
    /// silently reusing an id. Collections that already hold duplicates keep
    /// working without the unique guarantee.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.movies
            .create_index(
                IndexModel::builder().keys(doc! { "MovieID": 1 }).build(),
            )
            .await?;

        for (collection, key) in [
            (self.actors.clone_with_type::<Document>(), "ActorID"),
            (self.genres.clone_with_type::<Document>(), "GenreID"),
        ] {
            let model = IndexModel::builder()
                .keys(doc! { key: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            if let Err(err) = collection.create_index(model).await {
                warn!(
                    "Could not create unique index on {}.{}: {}",
                    collection.name(),
                    key,
                    err
                );
            }
        }

        for (collection, key) in [
            (self.actors.clone_with_type::<Document>(), "ActorName"),
            (self.genres.clone_with_type::<Document>(), "GenreName"),
        ] {
            collection
                .create_index(IndexModel::builder().keys(doc! { key: 1 }).build())
                .await?;
        }

        debug!("catalog indexes ensured");
        Ok(())
    }

    /// Close pooled connections. Called once the HTTP server has drained.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("Database connection closed");
    }
}

fn map_insert_error(err: MongoError, what: String) -> CatalogError {
    let duplicate = matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    );
    if duplicate {
        CatalogError::DuplicateKey(what)
    } else {
        CatalogError::Database(err)
    }
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.movies.find(doc! {}).await?.try_collect().await?)
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        Ok(self.actors.find(doc! {}).await?.try_collect().await?)
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        Ok(self.genres.find(doc! {}).await?.try_collect().await?)
    }

    async fn find_actor_by_name(&self, name: &str) -> Result<Option<Actor>> {
        Ok(self.actors.find_one(doc! { "ActorName": name }).await?)
    }

    async fn find_genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        Ok(self.genres.find_one(doc! { "GenreName": name }).await?)
    }

    async fn latest_actor(&self) -> Result<Option<Actor>> {
        Ok(self
            .actors
            .find_one(doc! {})
            .sort(doc! { "ActorID": -1 })
            .await?)
    }

    async fn latest_genre(&self) -> Result<Option<Genre>> {
        Ok(self
            .genres
            .find_one(doc! {})
            .sort(doc! { "GenreID": -1 })
            .await?)
    }

    async fn insert_actor(&self, actor: &Actor) -> Result<()> {
        self.actors
            .insert_one(actor)
            .await
            .map_err(|err| map_insert_error(err, format!("ActorID {}", actor.id)))?;
        Ok(())
    }

    async fn insert_genre(&self, genre: &Genre) -> Result<()> {
        self.genres
            .insert_one(genre)
            .await
            .map_err(|err| map_insert_error(err, format!("GenreID {}", genre.id)))?;
        Ok(())
    }

    async fn upsert_movie(&self, movie: &Movie) -> Result<()> {
        let result = self
            .movies
            .replace_one(doc! { "MovieID": movie.id.get() }, movie)
            .upsert(true)
            .await?;
        debug!(
            "upsert movie {}: matched={}, upserted={}",
            movie.id,
            result.matched_count,
            result.upserted_id.is_some()
        );
        Ok(())
    }

    async fn upsert_actor(&self, actor: &Actor) -> Result<()> {
        let result = self
            .actors
            .replace_one(doc! { "ActorID": actor.id.get() }, actor)
            .upsert(true)
            .await
            .map_err(|err| map_insert_error(err, format!("ActorID {}", actor.id)))?;
        debug!(
            "upsert actor {}: matched={}, upserted={}",
            actor.id,
            result.matched_count,
            result.upserted_id.is_some()
        );
        Ok(())
    }

    async fn increment_movie_plays(&self, id: MovieID) -> Result<bool> {
        let result = self
            .movies
            .update_one(
                doc! { "MovieID": id.get() },
                doc! { "$inc": { "MoviePlays": 1 } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
