//! Domain types and models

pub mod news;

pub use news::NewsItem;
