//! Name → sequential id resolution for actors and genres.
//!
//! A name that already exists resolves to its id. An unseen name gets
//! `max(id) + 1` (or `1` in an empty collection) and a new record is inserted.
//! Allocations of one kind are serialized inside the process; an insert that
//! still collides (another process won) re-reads the latest id and retries.

use async_trait::async_trait;
use moviedb_model::{Actor, ActorID, Genre, GenreID, SequentialId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    database::CatalogStore,
    error::{CatalogError, Result},
};

/// Attempts per name before giving up on a contended sequence.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct IdAllocator {
    store: Arc<dyn CatalogStore>,
    actor_sequence: Arc<Mutex<()>>,
    genre_sequence: Arc<Mutex<()>>,
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdAllocator").finish_non_exhaustive()
    }
}

impl IdAllocator {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            actor_sequence: Arc::new(Mutex::new(())),
            genre_sequence: Arc::new(Mutex::new(())),
        }
    }

    pub async fn resolve_actor(&self, name: &str) -> Result<ActorID> {
        resolve(&Actors(self.store.as_ref()), &self.actor_sequence, name).await
    }

    pub async fn resolve_genre(&self, name: &str) -> Result<GenreID> {
        resolve(&Genres(self.store.as_ref()), &self.genre_sequence, name).await
    }

    /// Resolve every name, in order. Failures are collected and reported
    /// together; records minted before a failure stay in place.
    pub async fn resolve_actors(
        &self,
        names: &[&str],
    ) -> Result<Vec<ActorID>> {
        let mut ids = Vec::with_capacity(names.len());
        let mut errors = Vec::new();
        for name in names {
            match self.resolve_actor(name).await {
                Ok(id) => ids.push(id),
                Err(err) => {
                    warn!("Failed to resolve actor '{}': {}", name, err);
                    errors.push(err.to_string());
                }
            }
        }
        collect(<Actors<'_> as NamedSequence>::KIND, ids, errors)
    }

    pub async fn resolve_genres(
        &self,
        names: &[&str],
    ) -> Result<Vec<GenreID>> {
        let mut ids = Vec::with_capacity(names.len());
        let mut errors = Vec::new();
        for name in names {
            match self.resolve_genre(name).await {
                Ok(id) => ids.push(id),
                Err(err) => {
                    warn!("Failed to resolve genre '{}': {}", name, err);
                    errors.push(err.to_string());
                }
            }
        }
        collect(<Genres<'_> as NamedSequence>::KIND, ids, errors)
    }
}

fn collect<Id>(
    kind: &'static str,
    ids: Vec<Id>,
    errors: Vec<String>,
) -> Result<Vec<Id>> {
    if errors.is_empty() {
        Ok(ids)
    } else {
        Err(CatalogError::Allocation { kind, errors })
    }
}

/// One named, sequentially numbered collection.
#[async_trait]
trait NamedSequence: Send + Sync {
    type Id: SequentialId;
    const KIND: &'static str;

    async fn find(&self, name: &str) -> Result<Option<Self::Id>>;
    async fn latest(&self) -> Result<Option<Self::Id>>;
    async fn insert(&self, id: Self::Id, name: &str) -> Result<()>;
}

struct Actors<'a>(&'a dyn CatalogStore);

#[async_trait]
impl NamedSequence for Actors<'_> {
    type Id = ActorID;
    const KIND: &'static str = "actor";

    async fn find(&self, name: &str) -> Result<Option<ActorID>> {
        Ok(self.0.find_actor_by_name(name).await?.map(|actor| actor.id))
    }

    async fn latest(&self) -> Result<Option<ActorID>> {
        Ok(self.0.latest_actor().await?.map(|actor| actor.id))
    }

    async fn insert(&self, id: ActorID, name: &str) -> Result<()> {
        let mut actor = Actor::named(id, name);
        actor.added = Some(chrono::Local::now().to_rfc3339());
        self.0.insert_actor(&actor).await
    }
}

struct Genres<'a>(&'a dyn CatalogStore);

#[async_trait]
impl NamedSequence for Genres<'_> {
    type Id = GenreID;
    const KIND: &'static str = "genre";

    async fn find(&self, name: &str) -> Result<Option<GenreID>> {
        Ok(self.0.find_genre_by_name(name).await?.map(|genre| genre.id))
    }

    async fn latest(&self) -> Result<Option<GenreID>> {
        Ok(self.0.latest_genre().await?.map(|genre| genre.id))
    }

    async fn insert(&self, id: GenreID, name: &str) -> Result<()> {
        self.0.insert_genre(&Genre::named(id, name)).await
    }
}

async fn resolve<S: NamedSequence>(
    sequence: &S,
    lock: &Mutex<()>,
    name: &str,
) -> Result<S::Id> {
    if let Some(id) = sequence.find(name).await? {
        return Ok(id);
    }

    let _guard = lock.lock().await;

    // Another task may have minted this name while we waited.
    if let Some(id) = sequence.find(name).await? {
        return Ok(id);
    }

    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let id = sequence
            .latest()
            .await?
            .map_or(S::Id::FIRST, SequentialId::successor);

        match sequence.insert(id, name).await {
            Ok(()) => {
                info!("Allocated {} id {} for '{}'", S::KIND, id, name);
                return Ok(id);
            }
            Err(err) if err.is_duplicate_key() => {
                debug!(
                    "{} id {} taken on attempt {}/{}, retrying",
                    S::KIND,
                    id,
                    attempt,
                    MAX_ALLOCATION_ATTEMPTS
                );
            }
            Err(err) => return Err(err),
        }
    }

    Err(CatalogError::Internal(format!(
        "gave up allocating a {} id for '{}' after {} attempts",
        S::KIND,
        name,
        MAX_ALLOCATION_ATTEMPTS
    )))
}
