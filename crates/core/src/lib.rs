//! Core library for picking a TV episode, fetching matching subtitles and
//! handing both to a streaming player.

pub mod cache;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod lookup;
pub mod player;
pub mod prompt;
pub mod run;
pub mod select;
pub mod show;
