//! Cross-cutting helpers: database error categorization and template rendering.

pub mod db_errors;
pub mod handlebars;

pub use handlebars::{get_handlebars, truncate_chars, write_string_to_file};
