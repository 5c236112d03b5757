//! Core data model definitions shared across moviedb crates.
#![allow(missing_docs)]

pub mod catalog;
pub mod ids;
pub mod image;

pub use catalog::{
    Actor, CatalogSnapshot, Genre, Movie, MovieSubmission, PlayRequest,
    split_names,
};
pub use ids::{ActorID, GenreID, MovieID, SequentialId};
pub use image::{
    DeriveMode, ImageCategory, ImageDirectives, ImageQuery, RegionAnchor,
    parse_dimension,
};
