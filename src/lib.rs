pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod parser;
pub mod schema;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::{CsvOptions, ErrorPolicy, LoaderConfig};
pub use error::{IndexError, LoadCause, LoadError, RowError, SchemaError, VerificationWarning};
