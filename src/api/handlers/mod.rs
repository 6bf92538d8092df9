//! API request handlers.

/// Health, domain roster and tool listing.
pub mod catalog;
/// Session start and the live event stream.
pub mod sessions;
