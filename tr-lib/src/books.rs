use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

static BOOKS_JSON: &str = include_str!("../assets/books.json");

static BUNDLED: Lazy<BookRegistry> = Lazy::new(|| {
    BookRegistry::from_json(BOOKS_JSON).expect("bundled books.json is valid")
});

#[derive(Clone, Debug, Deserialize)]
struct BookEntry {
    slug: String,
    #[allow(dead_code)]
    name: String,
    anth: String,
    num: u32,
}

/// Static lookup from book slug to anthology and ordinal number.
///
/// Backed by the bundled `books.json`; loaded once and read-only for the
/// lifetime of the process. Unknown slugs resolve to `None` rather than an
/// error so callers can surface them as data-quality warnings.
pub struct BookRegistry {
    by_slug: HashMap<String, BookEntry>,
}

impl BookRegistry {
    pub fn bundled() -> &'static BookRegistry {
        &BUNDLED
    }

    fn from_json(json: &str) -> Result<BookRegistry, serde_json::Error> {
        let entries: Vec<BookEntry> = serde_json::from_str(json)?;
        let by_slug = entries.into_iter().map(|e| (e.slug.clone(), e)).collect();
        Ok(BookRegistry { by_slug })
    }

    /// Anthology (`ot` or `nt`) the book belongs to.
    pub fn anthology(&self, slug: &str) -> Option<&str> {
        self.by_slug.get(slug).map(|e| e.anth.as_str())
    }

    /// Ordinal book number, 1-based across both anthologies.
    pub fn book_number(&self, slug: &str) -> Option<u32> {
        self.by_slug.get(slug).map(|e| e.num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_books() {
        let reg = BookRegistry::bundled();
        assert_eq!(reg.anthology("gen"), Some("ot"));
        assert_eq!(reg.book_number("gen"), Some(1));
        assert_eq!(reg.anthology("mrk"), Some("nt"));
        assert_eq!(reg.book_number("mrk"), Some(41));
        assert_eq!(reg.anthology("psa"), Some("ot"));
        assert_eq!(reg.book_number("psa"), Some(19));
        assert_eq!(reg.book_number("rev"), Some(66));
    }

    #[test]
    fn test_numbered_slugs() {
        let reg = BookRegistry::bundled();
        assert_eq!(reg.anthology("1jn"), Some("nt"));
        assert_eq!(reg.book_number("1jn"), Some(62));
        assert_eq!(reg.book_number("2sa"), Some(10));
    }

    #[test]
    fn test_unknown_slug_is_none() {
        let reg = BookRegistry::bundled();
        assert_eq!(reg.anthology("xyz"), None);
        assert_eq!(reg.book_number("xyz"), None);
    }
}
