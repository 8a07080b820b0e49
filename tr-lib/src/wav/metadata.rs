//! Serialization of the application sub-chunks that follow the audio
//! payload: a standard RIFF `cue ` chunk, a `LIST/adtl` chunk holding one
//! `labl` per cue, and a `LIST/INFO` chunk whose `IART` entry carries the
//! identification fields as JSON. Every chunk declares its own byte length
//! and is padded to an even size, so readers can skip anything they don't
//! recognize.

use serde::{Deserialize, Serialize};

/// A labeled marker at a sample offset, used for verse boundaries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WavCue {
    pub label: String,
    pub position: u32,
}

/// Identification metadata embedded in a take file.
///
/// Every field is stored in its canonical zero-padded string encoding; an
/// empty string means the field has not been set. Cue order is the order
/// the markers were placed in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WavMetadata {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub anthology: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub book_number: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub chapter: String,
    #[serde(default, rename = "startv")]
    pub start_verse: String,
    #[serde(default, rename = "endv")]
    pub end_verse: String,
    #[serde(skip)]
    pub cues: Vec<WavCue>,
}

impl WavMetadata {
    pub fn add_cue(&mut self, cue: WavCue) {
        self.cues.push(cue);
    }

    /// True when every identification field and at least one cue point are
    /// present. Takes failing this check still need fixing.
    pub fn is_complete(&self) -> bool {
        !self.language.is_empty()
            && !self.anthology.is_empty()
            && !self.version.is_empty()
            && !self.slug.is_empty()
            && !self.book_number.is_empty()
            && !self.mode.is_empty()
            && !self.chapter.is_empty()
            && !self.start_verse.is_empty()
            && !self.end_verse.is_empty()
            && !self.cues.is_empty()
    }

    /// Serialize the `cue ` chunk: a count followed by one 24-byte entry
    /// per cue point.
    pub(crate) fn encode_cue_chunk(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.cues.len() * 24);
        out.extend_from_slice(b"cue ");
        out.extend_from_slice(&(4 + 24 * self.cues.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.cues.len() as u32).to_le_bytes());
        for (i, cue) in self.cues.iter().enumerate() {
            let id = i as u32 + 1;
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&cue.position.to_le_bytes());
            out.extend_from_slice(b"data");
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&cue.position.to_le_bytes());
        }
        out
    }

    /// Serialize the `LIST/adtl` chunk carrying one null-terminated `labl`
    /// per cue, referencing cue ids from the `cue ` chunk.
    pub(crate) fn encode_label_chunk(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"adtl");
        for (i, cue) in self.cues.iter().enumerate() {
            let id = i as u32 + 1;
            let text_len = cue.label.len() + 1;
            body.extend_from_slice(b"labl");
            body.extend_from_slice(&((4 + text_len) as u32).to_le_bytes());
            body.extend_from_slice(&id.to_le_bytes());
            body.extend_from_slice(cue.label.as_bytes());
            body.push(0);
            if text_len % 2 == 1 {
                body.push(0);
            }
        }
        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(b"LIST");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Serialize the `LIST/INFO` chunk whose `IART` entry holds the
    /// identification fields as a JSON object.
    pub(crate) fn encode_info_chunk(&self) -> Result<Vec<u8>, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        let text_len = json.len() + 1;
        let mut body = Vec::with_capacity(12 + text_len);
        body.extend_from_slice(b"INFO");
        body.extend_from_slice(b"IART");
        body.extend_from_slice(&(text_len as u32).to_le_bytes());
        body.extend_from_slice(json.as_bytes());
        body.push(0);
        if text_len % 2 == 1 {
            body.push(0);
        }
        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(b"LIST");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Parse the metadata region that follows the audio payload.
    ///
    /// Unknown chunks are skipped by their declared size; absent or
    /// malformed chunks yield empty fields, never an error.
    pub(crate) fn from_trailing(bytes: &[u8]) -> WavMetadata {
        let mut meta = WavMetadata::default();
        let mut points: Vec<(u32, u32)> = Vec::new();
        let mut labels: Vec<(u32, String)> = Vec::new();

        let mut pos = 0;
        while pos + 8 <= bytes.len() {
            let tag = &bytes[pos..pos + 4];
            let size = read_u32(bytes, pos + 4) as usize;
            let data_start = pos + 8;
            let data_end = (data_start + size).min(bytes.len());
            let data = &bytes[data_start..data_end];

            match tag {
                b"cue " => parse_cue_points(data, &mut points),
                b"LIST" if data.len() >= 4 => match &data[0..4] {
                    b"adtl" => parse_labels(&data[4..], &mut labels),
                    b"INFO" => parse_info(&data[4..], &mut meta),
                    _ => {}
                },
                _ => {}
            }

            // Chunks are word-aligned (padded to even size).
            pos = data_start + size + (size & 1);
        }

        meta.cues = points
            .into_iter()
            .map(|(id, position)| {
                let label = labels
                    .iter()
                    .find(|(lid, _)| *lid == id)
                    .map(|(_, l)| l.clone())
                    .unwrap_or_default();
                WavCue { label, position }
            })
            .collect();
        meta
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

fn parse_cue_points(data: &[u8], points: &mut Vec<(u32, u32)>) {
    if data.len() < 4 {
        return;
    }
    let count = read_u32(data, 0) as usize;
    for i in 0..count {
        let entry = 4 + i * 24;
        if entry + 24 > data.len() {
            break;
        }
        let id = read_u32(data, entry);
        let sample_offset = read_u32(data, entry + 20);
        points.push((id, sample_offset));
    }
}

fn parse_labels(data: &[u8], labels: &mut Vec<(u32, String)>) {
    let mut pos = 0;
    while pos + 8 <= data.len() {
        let tag = &data[pos..pos + 4];
        let size = read_u32(data, pos + 4) as usize;
        let data_start = pos + 8;
        let data_end = (data_start + size).min(data.len());
        if tag == b"labl" && size >= 4 {
            let id = read_u32(data, data_start);
            let raw = &data[data_start + 4..data_end];
            let text = raw.split(|b| *b == 0).next().unwrap_or(&[]);
            labels.push((id, String::from_utf8_lossy(text).into_owned()));
        }
        pos = data_start + size + (size & 1);
    }
}

fn parse_info(data: &[u8], meta: &mut WavMetadata) {
    let mut pos = 0;
    while pos + 8 <= data.len() {
        let tag = &data[pos..pos + 4];
        let size = read_u32(data, pos + 4) as usize;
        let data_start = pos + 8;
        let data_end = (data_start + size).min(data.len());
        if tag == b"IART" {
            let raw = &data[data_start..data_end];
            let text = raw.split(|b| *b == 0).next().unwrap_or(&[]);
            if let Ok(parsed) = serde_json::from_slice::<WavMetadata>(text) {
                *meta = parsed;
            }
            return;
        }
        pos = data_start + size + (size & 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> WavMetadata {
        WavMetadata {
            language: "en".into(),
            anthology: "nt".into(),
            version: "ulb".into(),
            slug: "mrk".into(),
            book_number: "41".into(),
            mode: "chunk".into(),
            chapter: "01".into(),
            start_verse: "01".into(),
            end_verse: "04".into(),
            cues: vec![
                WavCue { label: "1".into(), position: 0 },
                WavCue { label: "3".into(), position: 88_200 },
            ],
        }
    }

    fn encode_all(meta: &WavMetadata) -> Vec<u8> {
        let mut bytes = meta.encode_cue_chunk();
        bytes.extend(meta.encode_label_chunk());
        bytes.extend(meta.encode_info_chunk().unwrap());
        bytes
    }

    #[test]
    fn test_round_trip() {
        let meta = sample_metadata();
        let parsed = WavMetadata::from_trailing(&encode_all(&meta));
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_empty_region_yields_empty_metadata() {
        let parsed = WavMetadata::from_trailing(&[]);
        assert_eq!(parsed, WavMetadata::default());
        assert!(!parsed.is_complete());
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let meta = sample_metadata();
        let mut bytes = Vec::new();
        // Unknown chunk with an odd payload size, to exercise padding.
        bytes.extend_from_slice(b"junk");
        bytes.extend_from_slice(&5u32.to_le_bytes());
        bytes.extend_from_slice(b"abcde\x00");
        bytes.extend(encode_all(&meta));
        let parsed = WavMetadata::from_trailing(&bytes);
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_garbage_json_yields_empty_fields() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&20u32.to_le_bytes());
        bytes.extend_from_slice(b"INFO");
        bytes.extend_from_slice(b"IART");
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(b"not json");
        let parsed = WavMetadata::from_trailing(&bytes);
        assert_eq!(parsed, WavMetadata::default());
    }

    #[test]
    fn test_truncated_cue_chunk_is_tolerated() {
        let meta = sample_metadata();
        let cue = meta.encode_cue_chunk();
        // Cut the second entry short.
        let parsed = WavMetadata::from_trailing(&cue[..cue.len() - 8]);
        assert_eq!(parsed.cues.len(), 1);
        assert_eq!(parsed.cues[0].position, 0);
    }

    #[test]
    fn test_is_complete_requires_every_field_and_a_cue() {
        let mut meta = sample_metadata();
        assert!(meta.is_complete());
        meta.cues.clear();
        assert!(!meta.is_complete());
        let mut meta = sample_metadata();
        meta.end_verse.clear();
        assert!(!meta.is_complete());
    }
}
