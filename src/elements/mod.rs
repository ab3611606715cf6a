mod catalog;
mod error;
mod parser;
mod types;

pub use catalog::{load_catalog, load_catalog_file, CatalogError};
pub use error::ParseError;
pub use parser::{parse, parse_with_limit, DEFAULT_DECAY_LIMIT_MINUTES};
pub use types::{ElementRecord, ParsedElements};
