pub mod catalog;
pub mod images;
pub mod ping;

pub use catalog::{
    list_catalog_handler, record_play_handler, submit_movie_handler,
    upsert_actor_handler,
};
pub use images::image_handler;
pub use ping::ping_handler;
