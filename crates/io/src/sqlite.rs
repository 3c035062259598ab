// Reference database (game master data, SQLite)

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};

use cjedb_recon::error::ReconError;
use cjedb_recon::model::{CharaId, StoryId};
use cjedb_recon::reference::ReferenceStore;

use crate::error::IoError;

/// `text_data` category holding character display names.
/// Not 6: that category misses non-trainee names such as 桐生院葵.
pub const CHARA_NAME_CATEGORY: i64 = 170;

/// `text_data` category holding story event titles.
pub const EVENT_TITLE_CATEGORY: i64 = 181;

/// Read-only view of the `text_data` table.
pub struct SqliteStore {
    conn: Connection,
    chara_category: i64,
    title_category: i64,
}

impl SqliteStore {
    /// Open an existing database read-only and check that `text_data` is queryable.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self::from_connection(conn);
        store.check_schema()?;
        tracing::debug!(path = %path.display(), "opened reference database");
        Ok(store)
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            chara_category: CHARA_NAME_CATEGORY,
            title_category: EVENT_TITLE_CATEGORY,
        }
    }

    pub fn with_categories(mut self, chara_category: i64, title_category: i64) -> Self {
        self.chara_category = chara_category;
        self.title_category = title_category;
        self
    }

    fn check_schema(&self) -> Result<(), IoError> {
        self.conn
            .prepare(r#"SELECT "index", category, text FROM text_data LIMIT 1"#)?;
        Ok(())
    }

    fn query_characters(&self) -> rusqlite::Result<Vec<(String, CharaId)>> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT "index", text FROM text_data WHERE category = ?1"#)?;
        let rows = stmt.query_map(params![self.chara_category], |row| {
            let id: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            Ok((text, id))
        })?;
        rows.collect()
    }

    fn query_exact(&self, text: &str) -> rusqlite::Result<Vec<StoryId>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT "index" FROM text_data WHERE category = ?1 AND text = ?2 ORDER BY "index""#,
        )?;
        let rows = stmt.query_map(params![self.title_category, text], |row| row.get(0))?;
        rows.collect()
    }

    // instr() instead of LIKE: titles contain `%`, `_` and mixed-case ASCII.
    fn query_containing(&self, text: &str) -> rusqlite::Result<Vec<(StoryId, String)>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT "index", text FROM text_data
               WHERE category = ?1 AND instr(text, ?2) > 0
               ORDER BY "index""#,
        )?;
        let rows = stmt.query_map(params![self.title_category, text], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        rows.collect()
    }
}

fn reference_err(e: rusqlite::Error) -> ReconError {
    ReconError::Reference(e.to_string())
}

impl ReferenceStore for SqliteStore {
    fn character_names(&self) -> Result<Vec<(String, CharaId)>, ReconError> {
        self.query_characters().map_err(reference_err)
    }

    fn story_ids_by_text(&self, text: &str) -> Result<Vec<StoryId>, ReconError> {
        self.query_exact(text).map_err(reference_err)
    }

    fn stories_containing(&self, text: &str) -> Result<Vec<(StoryId, String)>, ReconError> {
        self.query_containing(text).map_err(reference_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const SCHEMA: &str = r#"
        CREATE TABLE text_data (
            id INTEGER NOT NULL,
            category INTEGER NOT NULL,
            "index" INTEGER NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (category, "index")
        );
    "#;

    fn fixture() -> NamedTempFile {
        let file = NamedTempFile::with_suffix(".mdb").unwrap();
        let conn = Connection::open(file.path()).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        let rows: &[(i64, i64, &str)] = &[
            (170, 1007, "ゴールドシップ"),
            (170, 9002, "桐生院葵"),
            (6, 1007, "ゴールドシップ"),
            (181, 501007506, "ダンスレッスン"),
            (181, 501009506, "ダンスレッスン"),
            (181, 501007101, "100%の焼きそば"),
            (181, 501007102, "ABC_story"),
            (182, 501007999, "ダンスレッスン"),
        ];
        for (category, index, text) in rows {
            conn.execute(
                r#"INSERT INTO text_data (id, category, "index", text) VALUES (?1, ?1, ?2, ?3)"#,
                params![category, index, text],
            )
            .unwrap();
        }
        file
    }

    #[test]
    fn reads_character_category_only() {
        let file = fixture();
        let store = SqliteStore::open(file.path()).unwrap();
        let mut names = store.character_names().unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![("ゴールドシップ".to_string(), 1007), ("桐生院葵".to_string(), 9002)]
        );
    }

    #[test]
    fn exact_query_scoped_to_titles() {
        let file = fixture();
        let store = SqliteStore::open(file.path()).unwrap();
        assert_eq!(
            store.story_ids_by_text("ダンスレッスン").unwrap(),
            vec![501007506, 501009506]
        );
    }

    #[test]
    fn substring_query_is_literal() {
        let file = fixture();
        let store = SqliteStore::open(file.path()).unwrap();
        let rows = store.stories_containing("100%").unwrap();
        assert_eq!(rows, vec![(501007101, "100%の焼きそば".to_string())]);
        // LIKE would treat `_` as a wildcard and ignore ASCII case.
        assert!(store.stories_containing("abc").unwrap().is_empty());
        assert!(store.stories_containing("C_s").unwrap().len() == 1);
    }

    #[test]
    fn custom_categories() {
        let file = fixture();
        let store = SqliteStore::open(file.path()).unwrap().with_categories(6, 182);
        assert_eq!(store.story_ids_by_text("ダンスレッスン").unwrap(), vec![501007999]);
        assert_eq!(store.character_names().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteStore::open(&dir.path().join("missing.mdb"));
        assert!(matches!(result, Err(IoError::Sqlite(_))));
    }

    #[test]
    fn missing_table_fails_to_open() {
        let file = NamedTempFile::with_suffix(".mdb").unwrap();
        Connection::open(file.path())
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER);")
            .unwrap();
        assert!(SqliteStore::open(file.path()).is_err());
    }
}
