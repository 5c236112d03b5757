use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use moviedb_core::{
    CatalogError, CatalogStore, image::DisabledFaceDetector,
};
use moviedb_model::{Actor, ActorID, Genre, GenreID, Movie, MovieID};
use serde_json::{Value, json};
use tempfile::TempDir;

mod common;
use common::{build_app_state, build_test_app};

fn terminator() -> Value {
    json!({
        "MovieID": 7,
        "MovieName": "The Terminator",
        "MovieCode": "T-800",
        "MovieYear": 1984,
        "MovieLocation": ["/srv/movies/terminator.mkv"],
        "MovieImage": "terminator.jpg",
        "MovieThumbnail": "terminator.jpg",
        "MoviePlays": 0,
        "MovieGenres": "Action, Sci-Fi",
        "MovieActors": "Arnold Schwarzenegger, Linda Hamilton, ",
        "MovieStudio": "Orion"
    })
}

#[tokio::test]
async fn empty_catalog_lists_three_empty_collections() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.get("/").await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "movies": [], "actors": [], "genres": [] })
    );
    Ok(())
}

#[tokio::test]
async fn submitted_movie_gets_cast_and_genre_ids() -> Result<()> {
    let app = build_test_app()?;

    let response = app.server.post("/movie").json(&terminator()).await;
    response.assert_status_ok();
    assert!(response.as_bytes().is_empty());

    let catalog = app.server.get("/").await.json::<Value>();
    let movie = &catalog["movies"][0];
    assert_eq!(movie["MovieID"], 7);
    assert_eq!(movie["MovieActors"], json!([1, 2]));
    assert_eq!(movie["MovieGenres"], json!([1, 2]));
    assert_eq!(catalog["actors"][1]["ActorName"], "Linda Hamilton");
    assert_eq!(catalog["genres"][0]["GenreName"], "Action");
    Ok(())
}

#[tokio::test]
async fn known_names_reuse_their_ids() -> Result<()> {
    let app = build_test_app()?;
    app.server.post("/movie").json(&terminator()).await.assert_status_ok();

    let mut sequel = terminator();
    sequel["MovieID"] = json!(8);
    sequel["MovieName"] = json!("Terminator 2");
    sequel["MovieActors"] = json!("Linda Hamilton, Robert Patrick");
    sequel["MovieGenres"] = json!("Sci-Fi");
    app.server.post("/movie").json(&sequel).await.assert_status_ok();

    let stored = app.store.movie(MovieID(8)).await.expect("sequel stored");
    assert_eq!(stored.actors, vec![ActorID(2), ActorID(3)]);
    assert_eq!(stored.genres, vec![GenreID(2)]);
    assert_eq!(app.store.list_actors().await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn resubmitting_a_movie_replaces_it() -> Result<()> {
    let app = build_test_app()?;
    app.server.post("/movie").json(&terminator()).await.assert_status_ok();

    let replacement = json!({
        "MovieID": 7,
        "MovieName": "The Terminator (Remastered)",
        "MovieGenres": "",
        "MovieActors": ""
    });
    app.server.post("/movie").json(&replacement).await.assert_status_ok();

    let movies = app.store.list_movies().await?;
    assert_eq!(movies.len(), 1);
    assert_eq!(
        movies[0].name.as_deref(),
        Some("The Terminator (Remastered)")
    );
    assert_eq!(movies[0].studio, None);
    assert!(movies[0].actors.is_empty());
    Ok(())
}

#[tokio::test]
async fn actor_is_upserted_by_id() -> Result<()> {
    let app = build_test_app()?;

    let actor = json!({
        "ActorID": 4,
        "ActorName": "Michael Biehn",
        "ActorBirthday": "1956-07-31",
        "ActorImage": "biehn.jpg"
    });
    app.server.post("/actor").json(&actor).await.assert_status_ok();

    let mut renamed = actor.clone();
    renamed["ActorName"] = json!("Michael Connell Biehn");
    app.server.post("/actor").json(&renamed).await.assert_status_ok();

    let actors = app.store.list_actors().await?;
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].id, ActorID(4));
    assert_eq!(actors[0].name.as_deref(), Some("Michael Connell Biehn"));
    assert_eq!(actors[0].birthday.as_deref(), Some("1956-07-31"));
    Ok(())
}

#[tokio::test]
async fn play_increments_the_counter_once() -> Result<()> {
    let app = build_test_app()?;
    app.server.post("/movie").json(&terminator()).await.assert_status_ok();
    let before = app.store.movie(MovieID(7)).await.expect("stored");

    app.server
        .post("/play")
        .json(&json!({ "MovieID": 7 }))
        .await
        .assert_status_ok();

    let after = app.store.movie(MovieID(7)).await.expect("stored");
    assert_eq!(after.plays, Some(1));
    assert_eq!(
        Movie {
            plays: before.plays,
            ..after
        },
        before
    );
    Ok(())
}

#[tokio::test]
async fn play_for_unknown_movie_still_succeeds() -> Result<()> {
    let app = build_test_app()?;

    app.server
        .post("/play")
        .json(&json!({ "MovieID": 404 }))
        .await
        .assert_status_ok();

    assert!(app.store.list_movies().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn ping_reports_ok() -> Result<()> {
    let app = build_test_app()?;

    let body = app.server.get("/ping").await.json::<Value>();

    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
    Ok(())
}

/// Store whose every call fails, as if the database were unreachable.
struct UnreachableStore;

fn offline<T>() -> moviedb_core::Result<T> {
    Err(CatalogError::Internal("server selection timeout".into()))
}

#[async_trait]
impl CatalogStore for UnreachableStore {
    async fn list_movies(&self) -> moviedb_core::Result<Vec<Movie>> {
        offline()
    }
    async fn list_actors(&self) -> moviedb_core::Result<Vec<Actor>> {
        offline()
    }
    async fn list_genres(&self) -> moviedb_core::Result<Vec<Genre>> {
        offline()
    }
    async fn find_actor_by_name(
        &self,
        _name: &str,
    ) -> moviedb_core::Result<Option<Actor>> {
        offline()
    }
    async fn find_genre_by_name(
        &self,
        _name: &str,
    ) -> moviedb_core::Result<Option<Genre>> {
        offline()
    }
    async fn latest_actor(&self) -> moviedb_core::Result<Option<Actor>> {
        offline()
    }
    async fn latest_genre(&self) -> moviedb_core::Result<Option<Genre>> {
        offline()
    }
    async fn insert_actor(&self, _actor: &Actor) -> moviedb_core::Result<()> {
        offline()
    }
    async fn insert_genre(&self, _genre: &Genre) -> moviedb_core::Result<()> {
        offline()
    }
    async fn upsert_movie(&self, _movie: &Movie) -> moviedb_core::Result<()> {
        offline()
    }
    async fn upsert_actor(&self, _actor: &Actor) -> moviedb_core::Result<()> {
        offline()
    }
    async fn increment_movie_plays(
        &self,
        _id: MovieID,
    ) -> moviedb_core::Result<bool> {
        offline()
    }
}

#[tokio::test]
async fn store_failures_surface_as_500_with_message() -> Result<()> {
    let public = TempDir::new()?;
    let state = build_app_state(
        &public,
        Arc::new(UnreachableStore),
        Arc::new(DisabledFaceDetector),
    )?;
    let server = TestServer::new(moviedb_server::routes::create_app(state))?;

    let listing = server.get("/").expect_failure().await;
    listing.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = listing.json::<Value>();
    assert_eq!(body["error"]["status"], 500);
    assert_eq!(
        body["error"]["message"],
        "Internal error: server selection timeout"
    );

    let submission = server
        .post("/movie")
        .json(&terminator())
        .expect_failure()
        .await;
    submission.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let message = submission.json::<Value>()["error"]["message"].clone();
    assert!(
        message
            .as_str()
            .is_some_and(|m| m.starts_with("Failed to allocate actor ids")),
        "unexpected message: {message}"
    );
    Ok(())
}
