//! Persistence and upstream clients for Harmonist
//!
//! - [`storage`]: the contribution ledger, click counter and browser
//!   session store traits, with a local libsql implementation in [`local`]
//! - [`quotes`]: the quote-of-the-day client with its built-in fallback

pub mod local;
pub mod quotes;
pub mod storage;

pub use quotes::{
    DEFAULT_QUOTE_API_URL, DEFAULT_QUOTE_TIMEOUT, FALLBACK_QUOTE, Quote, QuoteClient, QuoteError,
};
pub use storage::*;
