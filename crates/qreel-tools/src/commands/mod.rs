//! CLI subcommands.

pub mod apple_secret;
pub mod kanji;
