//! Seoul restaurant discovery and dining chat on top of a grounded language
//! model.
//!
//! A backend reply is a single text channel: a leading fenced JSON block with
//! place records, then markdown narrative. [`decoding`] splits the two,
//! [`markup`] renders the narrative, and [`services`] sequences searches and
//! chat turns against a [`llm::GenerativeBackend`].

pub mod api;
pub mod config;
pub mod decoding;
pub mod error;
pub mod llm;
pub mod location;
pub mod map;
pub mod markup;
pub mod models;
pub mod services;
