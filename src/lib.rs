//! Plaza: a community blog where authors post to groups, readers comment,
//! and followers get a personal feed of the authors they follow.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
