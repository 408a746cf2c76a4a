//! Concrete identity provider implementations

mod google;

pub use google::{GoogleEndpoints, GoogleProvider};
