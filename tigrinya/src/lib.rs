//! This library provides facilities to reduce Tigrinya text to the stems of its words.
//!
//! Text is processed by a [`Pipeline`]: it is split in tokens (see [`tokenise`] module
//! documentation), the tokens are normalised and filtered for stop words (see [`normalise`] module
//! documentation) and finally stemmed by the [`Stemmer`].
//!
//! Stemming rules operate on a phonetic (Latin) form of the words, produced by the reversible
//! [`codec::GraphemeTable`]. The table, the affix lists and the stop words make up the
//! [`Config`], which can be loaded from disk or taken from the defaults compiled into the
//! library.
//!
//! Whole directories of documents can be converted with [`corpus::convert_dir`].

pub mod codec;
pub mod config;
pub mod corpus;
pub mod filter;
pub mod normalise;
pub mod stem;
pub mod tokenise;

mod error;
mod pipeline;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use stem::Stemmer;
