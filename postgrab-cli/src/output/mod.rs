//! Output formatting for the CLI: colored text and JSON.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

#[cfg(test)]
mod tests;
