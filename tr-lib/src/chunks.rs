use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

use crate::types::UNRESOLVED;

/// Chunk tables compiled into the binary, keyed by (anthology, book).
/// A deployment with more books points a [`ChunkStore`] at a directory
/// with the same `chunks/<anthology>/<book>/chunks.json` layout instead.
static BUNDLED: &[(&str, &str, &str)] = &[
    ("nt", "mrk", include_str!("../assets/chunks/nt/mrk/chunks.json")),
    ("nt", "jud", include_str!("../assets/chunks/nt/jud/chunks.json")),
    ("ot", "rut", include_str!("../assets/chunks/ot/rut/chunks.json")),
    ("ot", "oba", include_str!("../assets/chunks/ot/oba/chunks.json")),
];

#[derive(Clone, Debug, Deserialize)]
struct ChunkEntry {
    /// Chunk identifier: zero-padded chapter and start verse, `"01-05"`.
    id: String,
    /// Last verse of the chunk, as a decimal string.
    lastvs: String,
}

/// Chunk boundaries for one book: each entry maps a chunk id to the last
/// verse that chunk spans.
#[derive(Clone, Debug)]
pub struct ChunkTable {
    chunks: Vec<ChunkEntry>,
}

impl ChunkTable {
    pub fn from_json(json: &str) -> Result<ChunkTable, serde_json::Error> {
        let chunks = serde_json::from_str(json)?;
        Ok(ChunkTable { chunks })
    }

    /// Last verse of the chunk with the given id, or [`UNRESOLVED`] when
    /// the id is unknown.
    pub fn last_verse(&self, id: &str) -> i32 {
        self.chunks
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.lastvs.parse().ok())
            .unwrap_or(UNRESOLVED)
    }

    /// Last verse of a whole chapter: the `lastvs` of the chapter's final
    /// chunk entry. Used when only the chapter of a take is known.
    pub fn chapter_last_verse(&self, chapter: &str) -> i32 {
        let prefix = format!("{chapter}-");
        self.chunks
            .iter()
            .rev()
            .find(|c| c.id.starts_with(&prefix))
            .and_then(|c| c.lastvs.parse().ok())
            .unwrap_or(UNRESOLVED)
    }
}

/// Source of per-book chunk tables: either the bundled set or a directory
/// laid out as `<root>/chunks/<anthology>/<book>/chunks.json`.
#[derive(Clone, Debug, Default)]
pub struct ChunkStore {
    root: Option<PathBuf>,
}

impl ChunkStore {
    /// Store serving only the tables compiled into the binary.
    pub fn bundled() -> ChunkStore {
        ChunkStore { root: None }
    }

    /// Store reading tables from an on-disk assets directory.
    pub fn with_root(root: impl Into<PathBuf>) -> ChunkStore {
        ChunkStore { root: Some(root.into()) }
    }

    /// Load the chunk table for a book. A missing or unparseable table is
    /// a data-quality condition, not an error: it logs and returns `None`,
    /// and the affected takes end up reported as still incomplete.
    pub fn table(&self, anthology: &str, book: &str) -> Option<ChunkTable> {
        match &self.root {
            Some(root) => {
                let path = root
                    .join("chunks")
                    .join(anthology)
                    .join(book)
                    .join("chunks.json");
                let json = match std::fs::read_to_string(&path) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("no chunk table at {}: {e}", path.display());
                        return None;
                    }
                };
                match ChunkTable::from_json(&json) {
                    Ok(table) => Some(table),
                    Err(e) => {
                        warn!("bad chunk table at {}: {e}", path.display());
                        None
                    }
                }
            }
            None => {
                let json = BUNDLED
                    .iter()
                    .find(|(a, b, _)| *a == anthology && *b == book)
                    .map(|(_, _, json)| *json)?;
                ChunkTable::from_json(json).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"id": "01-01", "lastvs": "4"},
        {"id": "01-05", "lastvs": "8"},
        {"id": "02-01", "lastvs": "3"},
        {"id": "02-04", "lastvs": "12"}
    ]"#;

    #[test]
    fn test_last_verse_lookup() {
        let table = ChunkTable::from_json(TABLE).unwrap();
        assert_eq!(table.last_verse("01-01"), 4);
        assert_eq!(table.last_verse("02-04"), 12);
        assert_eq!(table.last_verse("03-01"), UNRESOLVED);
    }

    #[test]
    fn test_chapter_last_verse_is_final_entry_of_chapter() {
        let table = ChunkTable::from_json(TABLE).unwrap();
        assert_eq!(table.chapter_last_verse("01"), 8);
        assert_eq!(table.chapter_last_verse("02"), 12);
        assert_eq!(table.chapter_last_verse("03"), UNRESOLVED);
    }

    #[test]
    fn test_bundled_store_serves_mark() {
        let store = ChunkStore::bundled();
        let table = store.table("nt", "mrk").expect("mark is bundled");
        assert_eq!(table.last_verse("01-01"), 4);
        assert!(store.table("nt", "rev").is_none());
    }

    #[test]
    fn test_dir_store_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let book_dir = dir.path().join("chunks/nt/mrk");
        std::fs::create_dir_all(&book_dir).unwrap();
        std::fs::write(book_dir.join("chunks.json"), TABLE).unwrap();

        let store = ChunkStore::with_root(dir.path());
        let table = store.table("nt", "mrk").unwrap();
        assert_eq!(table.last_verse("01-05"), 8);
        assert!(store.table("ot", "gen").is_none());
    }
}
