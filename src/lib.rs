//! # choromap-client
//!
//! Session and data-transformation core for the choropleth map analysis
//! service: submit map images, follow the multi-stage server-side analysis
//! over a live push channel, rehydrate a finished session from its
//! shareable identifier, and turn the extracted table into per-attribute
//! geographic map datasets.
//!
//! The image-analysis pipeline itself and the rendering layer are external
//! collaborators; this crate implements everything between them:
//! - Tabular result parsing ([`table`], [`models::record`])
//! - State name resolution and dataset building ([`geo`])
//! - The session lifecycle state machine ([`models::session`])
//! - Push-channel decoding ([`channel`]) and the HTTP seam ([`client`])
//! - Whole-session rehydration ([`rehydrate`])
//! - Image–map correspondence ([`assets`])

pub mod assets;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod rehydrate;
pub mod table;

pub use error::{Error, FailureKind, Result};
