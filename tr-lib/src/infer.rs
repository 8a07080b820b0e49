//! Fills whatever identification metadata a take does not yet carry,
//! using the fields parsed from its filename and the reference tables.

use log::warn;

use crate::books::BookRegistry;
use crate::chunks::ChunkStore;
use crate::filename::unit_to_string;
use crate::types::{Mode, TakeIdentity, UNRESOLVED};
use crate::wav::{WavCue, WavMetadata};

/// How a metadata field is treated on an inference pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillRule {
    /// Written only when currently empty; existing values are never
    /// overwritten.
    IfEmpty,
    /// Recomputed on every pass; the value depends on the caller-supplied
    /// mode rather than on prior content.
    Always,
}

/// The identification fields the engine manages, in fill order. Start
/// verse precedes end verse because verse-mode end resolution reads the
/// start verse back out of the metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Language,
    Anthology,
    Version,
    Slug,
    BookNumber,
    Chapter,
    StartVerse,
    Mode,
    EndVerse,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Language,
        Field::Anthology,
        Field::Version,
        Field::Slug,
        Field::BookNumber,
        Field::Chapter,
        Field::StartVerse,
        Field::Mode,
        Field::EndVerse,
    ];

    pub fn rule(self) -> FillRule {
        match self {
            Field::Mode | Field::EndVerse => FillRule::Always,
            _ => FillRule::IfEmpty,
        }
    }

    pub fn get(self, meta: &WavMetadata) -> &str {
        match self {
            Field::Language => &meta.language,
            Field::Anthology => &meta.anthology,
            Field::Version => &meta.version,
            Field::Slug => &meta.slug,
            Field::BookNumber => &meta.book_number,
            Field::Chapter => &meta.chapter,
            Field::StartVerse => &meta.start_verse,
            Field::Mode => &meta.mode,
            Field::EndVerse => &meta.end_verse,
        }
    }

    fn set(self, meta: &mut WavMetadata, value: String) {
        match self {
            Field::Language => meta.language = value,
            Field::Anthology => meta.anthology = value,
            Field::Version => meta.version = value,
            Field::Slug => meta.slug = value,
            Field::BookNumber => meta.book_number = value,
            Field::Chapter => meta.chapter = value,
            Field::StartVerse => meta.start_verse = value,
            Field::Mode => meta.mode = value,
            Field::EndVerse => meta.end_verse = value,
        }
    }
}

/// Fill the take's metadata from its filename identity.
///
/// `IfEmpty` fields keep whatever they already hold; `Always` fields are
/// recomputed from the identity, the requested mode, and the chunk
/// boundary tables. Reference lookups that fail leave the field empty
/// with a warning; the take then shows up as still incomplete rather than
/// aborting the batch. Identities that matched no grammar are ignored
/// entirely.
pub fn update_metadata(
    meta: &mut WavMetadata,
    id: &TakeIdentity,
    mode: Mode,
    books: &BookRegistry,
    chunks: &ChunkStore,
) {
    if !id.matched {
        return;
    }

    for field in Field::ALL {
        if field.rule() == FillRule::IfEmpty && !field.get(meta).is_empty() {
            continue;
        }
        match resolve(field, meta, id, mode, books, chunks) {
            Some(value) => field.set(meta, value),
            // A recomputed field that can no longer be resolved must not
            // keep a value computed under different inputs.
            None if field.rule() == FillRule::Always => field.set(meta, String::new()),
            None => {}
        }
    }

    // Cue points are user-placed markers; seed the start-verse cue only
    // when none exist at all.
    if meta.cues.is_empty() {
        let start: i32 = meta.start_verse.parse().unwrap_or(1);
        meta.add_cue(WavCue { label: start.to_string(), position: 0 });
    }
}

fn resolve(
    field: Field,
    meta: &WavMetadata,
    id: &TakeIdentity,
    mode: Mode,
    books: &BookRegistry,
    chunks: &ChunkStore,
) -> Option<String> {
    match field {
        Field::Language => (!id.language.is_empty()).then(|| id.language.clone()),
        Field::Anthology => match books.anthology(&id.book) {
            Some(anth) => Some(anth.to_string()),
            None => {
                warn!("unknown book slug '{}'; anthology left unset", id.book);
                None
            }
        },
        Field::Version => (!id.source.is_empty()).then(|| id.source.clone()),
        Field::Slug => (!id.book.is_empty()).then(|| id.book.clone()),
        Field::BookNumber => {
            if id.book_number > 0 {
                Some(unit_to_string(id.book_number))
            } else {
                match books.book_number(&id.book) {
                    Some(num) => Some(unit_to_string(num as i32)),
                    None => {
                        warn!("unknown book slug '{}'; book number left unset", id.book);
                        None
                    }
                }
            }
        }
        Field::Chapter => (id.chapter != UNRESOLVED).then(|| unit_to_string(id.chapter)),
        Field::StartVerse => {
            let start = if id.start_verse == UNRESOLVED { 1 } else { id.start_verse };
            Some(unit_to_string(start))
        }
        Field::Mode => Some(mode.as_str().to_string()),
        Field::EndVerse => resolve_end_verse(meta, id, mode, books, chunks),
    }
}

fn resolve_end_verse(
    meta: &WavMetadata,
    id: &TakeIdentity,
    mode: Mode,
    books: &BookRegistry,
    chunks: &ChunkStore,
) -> Option<String> {
    if id.end_verse != UNRESOLVED {
        return Some(unit_to_string(id.end_verse));
    }

    let end = match mode {
        // A verse take spans exactly one verse.
        Mode::Verse => meta.start_verse.parse().unwrap_or(UNRESOLVED),
        Mode::Chunk => {
            let table = books
                .anthology(&id.book)
                .and_then(|anth| chunks.table(anth, &id.book));
            match table {
                Some(table) if id.start_verse == UNRESOLVED => {
                    table.chapter_last_verse(&unit_to_string(id.chapter))
                }
                Some(table) => {
                    let chunk_id = format!(
                        "{}-{}",
                        unit_to_string(id.chapter),
                        unit_to_string(id.start_verse)
                    );
                    table.last_verse(&chunk_id)
                }
                None => UNRESOLVED,
            }
        }
    };

    if end == UNRESOLVED {
        warn!(
            "could not resolve end verse for {} {} chapter {}; left unset",
            id.book, id.source, id.chapter
        );
        return None;
    }
    Some(unit_to_string(end))
}

/// Canonical filename for a take whose metadata has been filled in.
/// End verse appears only for chunk takes. Only legacy-named files ever
/// get renamed to this; current-grammar names are left in place.
pub fn canonical_file_name(meta: &WavMetadata, take: i32, mode: Mode) -> String {
    let end = if mode == Mode::Chunk {
        format!("-{}", meta.end_verse)
    } else {
        String::new()
    };
    format!(
        "{}_{}_b{}_{}_c{}_v{}{}_t{:02}.wav",
        meta.language, meta.version, meta.book_number, meta.slug, meta.chapter,
        meta.start_verse, end, take
    )
}
