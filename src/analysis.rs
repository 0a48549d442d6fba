//! Term transforms applied around the postings core.
//!
//! The postings store only needs two hooks from text analysis: an in-place
//! [`Stemmer`] run on every inserted term and a [`StopPredicate`] consulted when
//! a batch is dumped. Tokenization lives here too, but only the batch indexer
//! and the command line tool use it.

pub mod stemmer;
pub mod stop;
pub mod tokenizer;

pub use stemmer::{IdentityStemmer, Stemmer, SuffixStemmer};
pub use stop::{StopList, StopPredicate};
pub use tokenizer::tokenize;
