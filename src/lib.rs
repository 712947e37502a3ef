//! Memewire - A Meme Aggregator
//!
//! This crate serves a small web app that pulls top headlines and Reddit image
//! posts, and turns text prompts into Pollinations image generation URLs.

pub mod api;
pub mod config;
pub mod error;
pub mod image;
pub mod memes;
pub mod news;
pub mod reddit;
pub mod routes;
