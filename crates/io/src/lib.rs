// Collaborators of the matching engine: reference database, upstream
// payload, JSON output

pub mod error;
pub mod output;
pub mod sqlite;
pub mod upstream;

pub use error::IoError;
pub use output::Database;
pub use sqlite::SqliteStore;
