//! Reading and rewriting the fixed-layout wav containers produced by the
//! recorder: a 44-byte canonical header, a mono 16-bit 44.1 kHz PCM
//! payload, and application metadata sub-chunks appended after the
//! payload. The codec carries no business rules; it only moves bytes.

mod metadata;

pub use metadata::{WavCue, WavMetadata};

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

pub const SAMPLE_RATE: u32 = 44100;
pub const NUM_CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
/// Bytes per frame: one 16-bit sample.
pub const BLOCK_ALIGN: u16 = 2;
pub const HEADER_SIZE: u32 = 44;

/// Transfer size for payload copies during a splice.
const COPY_BUF: usize = 4096;

/// Fixed 4-byte tags at fixed header offsets. A file missing any of them
/// is not one of ours.
const HEADER_TAGS: [(usize, &[u8; 4]); 4] =
    [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")];

/// An open take file. Owns write access to its path while alive: the
/// processing loop never holds two of these for the same file.
#[derive(Debug)]
pub struct WavFile {
    path: PathBuf,
    metadata: WavMetadata,
    /// Payload bytes between the header and the metadata region.
    total_audio_length: u32,
    /// The riff size field: everything after the first 8 bytes.
    total_data_length: u32,
    /// Bytes of metadata sub-chunks currently on disk.
    metadata_length: u32,
}

fn build_header(total_data_length: u32, total_audio_length: u32) -> [u8; 44] {
    let byte_rate = SAMPLE_RATE * BLOCK_ALIGN as u32;
    let mut header = [0u8; 44];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&total_data_length.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // uncompressed PCM
    header[22..24].copy_from_slice(&NUM_CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&total_audio_length.to_le_bytes());
    header
}

impl WavFile {
    /// Open an existing take file, parse its header and any trailing
    /// metadata sub-chunks.
    pub fn open(path: impl Into<PathBuf>) -> Result<WavFile> {
        let path = path.into();
        let mut file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(ConvertError::MalformedHeader(format!(
                "{} is {file_len} bytes, shorter than the {HEADER_SIZE}-byte header",
                path.display()
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        for (offset, tag) in HEADER_TAGS {
            if &header[offset..offset + 4] != tag {
                return Err(ConvertError::MalformedHeader(format!(
                    "{} lacks the '{}' tag at offset {offset}",
                    path.display(),
                    String::from_utf8_lossy(tag)
                )));
            }
        }

        let mut total_data_length = u32::from_le_bytes(header[4..8].try_into().unwrap());
        let mut total_audio_length = u32::from_le_bytes(header[40..44].try_into().unwrap());

        // A riff size covering only the bare header means the recorder
        // never finalized the lengths; recover the payload length from the
        // file size instead (no metadata can have been written yet).
        if total_data_length == HEADER_SIZE - 8 {
            total_audio_length = (file_len - HEADER_SIZE as u64) as u32;
            total_data_length = total_audio_length + HEADER_SIZE - 8;
        }

        let metadata_start = HEADER_SIZE as u64 + total_audio_length as u64;
        if metadata_start > file_len {
            return Err(ConvertError::MalformedHeader(format!(
                "{} declares a {total_audio_length}-byte payload but is only {file_len} bytes",
                path.display()
            )));
        }

        let mut trailing = Vec::new();
        file.seek(SeekFrom::Start(metadata_start))?;
        file.read_to_end(&mut trailing)?;
        let metadata = WavMetadata::from_trailing(&trailing);

        Ok(WavFile {
            path,
            metadata,
            total_audio_length,
            total_data_length,
            metadata_length: trailing.len() as u32,
        })
    }

    /// Create a new, empty take file with just the fixed header.
    pub fn create(path: impl Into<PathBuf>, metadata: WavMetadata) -> Result<WavFile> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let total_data_length = HEADER_SIZE - 8;
        let mut file = File::create(&path)?;
        file.write_all(&build_header(total_data_length, 0))?;
        Ok(WavFile {
            path,
            metadata,
            total_audio_length: 0,
            total_data_length,
            metadata_length: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &WavMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut WavMetadata {
        &mut self.metadata
    }

    /// Payload length in bytes.
    pub fn audio_length(&self) -> u32 {
        self.total_audio_length
    }

    /// Add a marker at the given frame. Nothing is written until
    /// [`WavFile::commit`] is called.
    pub fn add_marker(&mut self, label: impl Into<String>, position: u32) -> &mut Self {
        self.metadata.add_cue(WavCue { label: label.into(), position });
        self
    }

    /// Append PCM samples to the payload. Any metadata region on disk is
    /// dropped; call [`WavFile::commit`] afterwards to restore it.
    pub fn append_audio(&mut self, samples: &[i16]) -> Result<()> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.set_len(HEADER_SIZE as u64 + self.total_audio_length as u64)?;
        let mut writer = BufWriter::new(file);
        writer.seek(SeekFrom::End(0))?;
        for sample in samples {
            writer.write_all(&sample.to_le_bytes())?;
        }
        writer.flush()?;

        self.total_audio_length += (samples.len() * BLOCK_ALIGN as usize) as u32;
        self.metadata_length = 0;
        self.rewrite_header()
    }

    /// Write the in-memory metadata back to disk.
    ///
    /// The whole metadata region is rewritten wholesale: the file is
    /// truncated at the payload boundary, then the cue, label, and info
    /// chunks are appended in that order and the header lengths updated.
    /// Re-running with the same metadata produces identical bytes, so a
    /// failed commit is healed by committing again.
    pub fn commit(&mut self) -> Result<()> {
        let cue = self.metadata.encode_cue_chunk();
        let labels = self.metadata.encode_label_chunk();
        let info = self.metadata.encode_info_chunk()?;

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        file.set_len(HEADER_SIZE as u64 + self.total_audio_length as u64)?;
        file.seek(SeekFrom::End(0))?;
        file.write_all(&cue)?;
        file.write_all(&labels)?;
        file.write_all(&info)?;

        self.metadata_length = (cue.len() + labels.len() + info.len()) as u32;
        self.total_data_length =
            self.total_audio_length + self.metadata_length + HEADER_SIZE - 8;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&build_header(self.total_data_length, self.total_audio_length))?;
        Ok(())
    }

    /// Build a new take at `out_path` whose payload is `base`'s payload
    /// with `insert`'s payload spliced in at the given frame. Metadata is
    /// inherited from `base` unchanged.
    ///
    /// Payloads are moved in bounded transfers rather than loaded whole;
    /// the result's size is verified before metadata is attached, and a
    /// mismatch fails the splice without touching `base`.
    pub fn splice(
        base: &WavFile,
        insert: &WavFile,
        insert_frame: u32,
        out_path: impl Into<PathBuf>,
    ) -> Result<WavFile> {
        let out_path = out_path.into();
        let insert_offset = insert_frame as u64 * BLOCK_ALIGN as u64;
        let base_len = base.total_audio_length as u64;
        let insert_len = insert.total_audio_length as u64;
        let tail_len = base_len.checked_sub(insert_offset).ok_or_else(|| {
            ConvertError::InvalidInput(format!(
                "insert frame {insert_frame} is past the end of {}",
                base.path.display()
            ))
        })?;

        let mut out = WavFile::create(&out_path, base.metadata.clone())?;
        {
            let mut base_reader = BufReader::new(File::open(&base.path)?);
            base_reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
            let mut insert_reader = BufReader::new(File::open(&insert.path)?);
            insert_reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;

            let file = OpenOptions::new().write(true).open(&out_path)?;
            let mut writer = BufWriter::new(file);
            writer.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
            copy_exact(&mut base_reader, &mut writer, insert_offset)?;
            copy_exact(&mut insert_reader, &mut writer, insert_len)?;
            copy_exact(&mut base_reader, &mut writer, tail_len)?;
            writer.flush()?;
        }

        let expected = HEADER_SIZE as u64 + base_len + insert_len;
        let actual = std::fs::metadata(&out_path)?.len();
        if actual != expected {
            return Err(ConvertError::SpliceSizeMismatch { expected, actual });
        }

        out.total_audio_length = (base_len + insert_len) as u32;
        out.commit()?;
        Ok(out)
    }

    fn rewrite_header(&mut self) -> Result<()> {
        self.total_data_length =
            self.total_audio_length + self.metadata_length + HEADER_SIZE - 8;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.write_all(&build_header(self.total_data_length, self.total_audio_length))?;
        Ok(())
    }
}

fn copy_exact(reader: &mut impl Read, writer: &mut impl Write, mut remaining: u64) -> Result<()> {
    let mut buf = [0u8; COPY_BUF];
    while remaining > 0 {
        let want = remaining.min(COPY_BUF as u64) as usize;
        reader.read_exact(&mut buf[..want])?;
        writer.write_all(&buf[..want])?;
        remaining -= want as u64;
    }
    Ok(())
}
