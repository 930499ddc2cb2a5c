//! Multilingual content service for a podcast and cultural-media showcase
//! site.
//!
//! Every page load resolves one visitor language, then looks up section
//! content, media and flat records in that language against a hosted
//! relational store, falling back to the store's default language and
//! finally to built-in literals.

pub mod audit;
pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod geolocation;
pub mod i18n;
pub mod models;
pub mod records;
pub mod scheduler;
pub mod security;
pub mod server;
pub mod social;
pub mod store;
