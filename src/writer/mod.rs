pub mod batch;
pub mod schema_gen;
pub mod sqlite;

pub use batch::*;
pub use sqlite::*;
