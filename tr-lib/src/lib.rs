//! Normalizes metadata embedded in the wav take files produced by the
//! translation recorder, migrating projects recorded under older naming
//! and metadata conventions to the current schema.
//!
//! The pieces fit together as: [`filename::parse`] extracts a take's
//! identity from its name, [`infer::update_metadata`] fills whatever the
//! container doesn't carry yet (consulting [`books::BookRegistry`] and
//! [`chunks::ChunkStore`]), and [`wav::WavFile`] reads and rewrites the
//! container itself. [`convert::Converter`] and [`transform::Transformer`]
//! drive those pieces over whole recording trees.

pub mod books;
pub mod chunks;
pub mod convert;
pub mod error;
pub mod filename;
mod fsops;
pub mod infer;
pub mod transform;
pub mod types;
pub mod wav;

pub use error::{ConvertError, Result};
pub use types::{Grammar, Mode, Project, TakeIdentity, UNRESOLVED};
