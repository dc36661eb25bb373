//! # lexcorpus
//!
//! An extraction and retrieval pipeline for Indian court judgments.
//!
//! lexcorpus turns a directory of judgment PDFs into a searchable corpus:
//! text is pulled out through a chain of extraction strategies, cleaned and
//! mined for metadata, embedded in resumable batches, and queried with exact
//! cosine-similarity search from a CLI and a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │ PDF dir  │──▶│ Extract+Clean │──▶│  SQLite   │
//! │          │   │ Embed batches │   │ + vectors │
//! └──────────┘   └───────────────┘   └────┬──────┘
//!                                         │
//!                     ┌───────────────────┤
//!                     ▼                   ▼
//!                ┌──────────┐       ┌──────────┐
//!                │   CLI    │       │   HTTP   │
//!                │  (lex)   │       │  (axum)  │
//!                └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lex init                        # write starter config + create database
//! lex extract                     # pull text out of data/judgments
//! lex embed pending               # embed extracted cases
//! lex search "anticipatory bail"  # rank the corpus against a query
//! lex serve                       # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF text extraction strategies and cleanup |
//! | [`metadata`] | Heuristic metadata mining over raw text |
//! | [`ingest`] | Extraction pipeline driver |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`embed_cmd`] | Resumable batch embedding runs |
//! | [`search`] | Exact cosine-similarity retrieval |
//! | [`get`] | Case lookup |
//! | [`stats`] | Corpus counters |
//! | [`server`] | JSON HTTP API |
//! | [`store`] | Case persistence |
//! | [`progress`] | Progress reporting |

pub mod config;
pub mod embed_cmd;
pub mod embedding;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod metadata;
pub mod models;
pub mod progress;
pub mod search;
pub mod server;
pub mod stats;
pub mod store;
