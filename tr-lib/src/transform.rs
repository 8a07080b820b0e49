//! Retargeting a project's language and/or version: the project manifest,
//! every take's embedded metadata, the take filenames, and finally the
//! project's place in the directory tree all move together.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use log::{info, warn};
use serde_json::{json, Value};

use crate::error::{ConvertError, Result};
use crate::fsops;
use crate::wav::WavFile;

/// What to retarget a project to. `None` fields are left as they are.
#[derive(Clone, Debug, Default)]
pub struct Retarget {
    pub language: Option<String>,
    /// Display name written into the manifest alongside the language slug.
    pub language_name: Option<String>,
    pub version: Option<String>,
}

pub struct Transformer {
    root: PathBuf,
    project_dir: PathBuf,
    stamp_dir: PathBuf,
    source_language: String,
    source_version: String,
    source_book: Option<String>,
    target: Retarget,
    // Identity read from the takes themselves, used when only one of
    // language/version is being retargeted.
    original_language: String,
    original_version: String,
}

impl Transformer {
    /// `source_book` of `None` transforms every book under the
    /// language/version pair.
    pub fn new(
        root: impl Into<PathBuf>,
        source_language: &str,
        source_version: &str,
        source_book: Option<&str>,
        target: Retarget,
    ) -> Result<Transformer> {
        let root: PathBuf = root.into();
        let mut project_dir = root.join(source_language).join(source_version);
        if let Some(book) = source_book {
            project_dir = project_dir.join(book);
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let archive_dir = root.with_file_name(format!("{name}Archive"));
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

        Ok(Transformer {
            root,
            project_dir,
            stamp_dir: archive_dir.join(stamp),
            source_language: source_language.to_string(),
            source_version: source_version.to_string(),
            source_book: source_book.map(str::to_string),
            target,
            original_language: String::new(),
            original_version: String::new(),
        })
    }

    /// Run the whole transformation. Returns how many take files were
    /// affected.
    pub fn execute(&mut self) -> Result<usize> {
        if self.target.language.is_none() && self.target.version.is_none() {
            info!("nothing to retarget");
            return Ok(0);
        }
        if !self.project_dir.is_dir() {
            return Err(ConvertError::InvalidInput(format!(
                "project directory {} doesn't exist",
                self.project_dir.display()
            )));
        }

        self.create_backup()?;
        self.update_manifest()?;
        let counter = self.update_take_files()?;
        self.rename_folders()?;
        info!("transformation complete: {counter} file(s) affected");
        Ok(counter)
    }

    fn create_backup(&self) -> Result<()> {
        let mut dest = self
            .stamp_dir
            .join(&self.source_language)
            .join(&self.source_version);
        if let Some(book) = &self.source_book {
            dest = dest.join(book);
        }
        fsops::copy_dir_recursive(&self.project_dir, &dest)?;
        Ok(())
    }

    /// Rewrite `manifest.json` in place: the language/version identity
    /// plus every take's `name` and `location`. A missing or unparseable
    /// manifest is skipped with a warning; the takes still get fixed.
    fn update_manifest(&self) -> Result<()> {
        let path = self.project_dir.join("manifest.json");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("no manifest at {}: {e}", path.display());
                return Ok(());
            }
        };
        let mut manifest: Value = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("unparseable manifest at {}: {e}", path.display());
                return Ok(());
            }
        };

        if let Some(language) = &self.target.language {
            manifest["language"]["slug"] = json!(language);
            manifest["language"]["name"] =
                json!(self.target.language_name.clone().unwrap_or_default());
        }
        if let Some(version) = &self.target.version {
            manifest["version"]["slug"] = json!(version);
            manifest["version"]["name"] = json!(version_name(version));
        }

        let language = manifest["language"]["slug"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let version = manifest["version"]["slug"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if let Some(chapters) = manifest["manifest"].as_array_mut() {
            for chapter in chapters {
                let Some(chunks) = chapter["chunks"].as_array_mut() else {
                    continue;
                };
                for chunk in chunks {
                    let Some(takes) = chunk["takes"].as_array_mut() else {
                        continue;
                    };
                    for take in takes {
                        if let Some(name) = take["name"].as_str() {
                            take["name"] = json!(retarget_name(name, &language, &version));
                        }
                        if let Some(location) = take["location"].as_str() {
                            let mut parts: Vec<String> =
                                location.split('/').map(str::to_string).collect();
                            if let Some(last) = parts.last_mut() {
                                *last = retarget_name(last, &language, &version);
                            }
                            take["location"] = json!(parts.join("/"));
                        }
                    }
                }
            }
        }

        fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&manifest)?))?;
        Ok(())
    }

    fn update_take_files(&mut self) -> Result<usize> {
        let mut counter = 0;
        for take in fsops::wav_files(&self.project_dir)? {
            let mut wav = match WavFile::open(&take) {
                Ok(wav) => wav,
                Err(e) => {
                    warn!("skipping {}: {e}", take.display());
                    continue;
                }
            };

            self.original_language = wav.metadata().language.clone();
            self.original_version = wav.metadata().version.clone();

            if let Some(language) = &self.target.language {
                wav.metadata_mut().language = language.clone();
            }
            if let Some(version) = &self.target.version {
                wav.metadata_mut().version = version.clone();
            }
            if let Err(e) = wav.commit() {
                warn!("failed to write metadata to {}: {e}", take.display());
                continue;
            }

            let name = take
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let new_name = retarget_name(
                &name,
                &wav.metadata().language,
                &wav.metadata().version,
            );
            if new_name != name {
                fs::rename(&take, take.with_file_name(&new_name))?;
            }
            counter += 1;
        }
        Ok(counter)
    }

    /// Move the project directory to its new home in the tree.
    fn rename_folders(&mut self) -> Result<()> {
        let language = self
            .target
            .language
            .clone()
            .unwrap_or_else(|| self.original_language.clone());
        let version = self
            .target
            .version
            .clone()
            .unwrap_or_else(|| self.original_version.clone());
        if language.is_empty() || version.is_empty() {
            warn!("could not determine the project's new location; leaving it in place");
            return Ok(());
        }

        let mut dest = self.root.join(language).join(version);
        if let Some(book) = &self.source_book {
            dest = dest.join(book);
        }
        if dest == self.project_dir {
            return Ok(());
        }

        fsops::copy_dir_recursive(&self.project_dir, &dest)?;
        fs::remove_dir_all(&self.project_dir)?;
        self.project_dir = dest;
        Ok(())
    }
}

/// Swap the language and version sections of a take filename. Names with
/// fewer than two sections (e.g. `chapter.wav`) pass through unchanged.
fn retarget_name(name: &str, language: &str, version: &str) -> String {
    let mut parts: Vec<String> = name.split('_').map(str::to_string).collect();
    if parts.len() > 1 {
        parts[0] = language.to_string();
        parts[1] = version.to_string();
    }
    parts.join("_")
}

fn version_name(version: &str) -> &'static str {
    match version {
        "ulb" => "unlocked literal bible",
        "udb" => "unlocked dynamic bible",
        _ => "Regular",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::WavMetadata;
    use std::path::Path;

    fn write_take(path: &Path, meta: WavMetadata) {
        let mut wav = WavFile::create(path, meta).unwrap();
        wav.append_audio(&[1; 20]).unwrap();
        wav.commit().unwrap();
    }

    fn sample_manifest() -> Value {
        json!({
            "language": {"slug": "en", "name": "English"},
            "version": {"slug": "ulb", "name": "unlocked literal bible"},
            "book": {"slug": "jud"},
            "manifest": [{
                "chapter": 1,
                "chunks": [{
                    "id": 1,
                    "takes": [{
                        "name": "en_ulb_b65_jud_c01_v01-05_t01.wav",
                        "location": "takes/en_ulb_b65_jud_c01_v01-05_t01.wav"
                    }]
                }]
            }]
        })
    }

    fn take_metadata() -> WavMetadata {
        WavMetadata {
            language: "en".into(),
            version: "ulb".into(),
            slug: "jud".into(),
            ..WavMetadata::default()
        }
    }

    #[test]
    fn test_retarget_language_moves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        let project = root.join("en/ulb/jud");
        std::fs::create_dir_all(&project).unwrap();
        write_take(
            &project.join("en_ulb_b65_jud_c01_v01-05_t01.wav"),
            take_metadata(),
        );
        std::fs::write(
            project.join("manifest.json"),
            serde_json::to_string_pretty(&sample_manifest()).unwrap(),
        )
        .unwrap();

        let mut transformer = Transformer::new(
            &root,
            "en",
            "ulb",
            Some("jud"),
            Retarget {
                language: Some("fr".into()),
                language_name: Some("français".into()),
                version: None,
            },
        )
        .unwrap();
        assert_eq!(transformer.execute().unwrap(), 1);

        let new_project = root.join("fr/ulb/jud");
        assert!(new_project.is_dir());
        assert!(!root.join("en/ulb/jud").exists());

        let renamed = new_project.join("fr_ulb_b65_jud_c01_v01-05_t01.wav");
        assert!(renamed.is_file());
        let wav = WavFile::open(&renamed).unwrap();
        assert_eq!(wav.metadata().language, "fr");
        assert_eq!(wav.metadata().version, "ulb");

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(new_project.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["language"]["slug"], "fr");
        assert_eq!(manifest["language"]["name"], "français");
        // Untouched sections survive the rewrite.
        assert_eq!(manifest["book"]["slug"], "jud");
        let take = &manifest["manifest"][0]["chunks"][0]["takes"][0];
        assert_eq!(take["name"], "fr_ulb_b65_jud_c01_v01-05_t01.wav");
        assert_eq!(take["location"], "takes/fr_ulb_b65_jud_c01_v01-05_t01.wav");
    }

    #[test]
    fn test_retarget_version_updates_manifest_version_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        let project = root.join("en/ulb/jud");
        std::fs::create_dir_all(&project).unwrap();
        write_take(
            &project.join("en_ulb_b65_jud_c01_v01-05_t01.wav"),
            take_metadata(),
        );
        std::fs::write(
            project.join("manifest.json"),
            sample_manifest().to_string(),
        )
        .unwrap();

        let mut transformer = Transformer::new(
            &root,
            "en",
            "ulb",
            Some("jud"),
            Retarget {
                version: Some("udb".into()),
                ..Retarget::default()
            },
        )
        .unwrap();
        assert_eq!(transformer.execute().unwrap(), 1);

        let new_project = root.join("en/udb/jud");
        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(new_project.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["version"]["slug"], "udb");
        assert_eq!(manifest["version"]["name"], "unlocked dynamic bible");
        assert!(new_project
            .join("en_udb_b65_jud_c01_v01-05_t01.wav")
            .is_file());
    }

    #[test]
    fn test_no_target_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        std::fs::create_dir_all(root.join("en/ulb/jud")).unwrap();
        let mut transformer =
            Transformer::new(&root, "en", "ulb", Some("jud"), Retarget::default()).unwrap();
        assert_eq!(transformer.execute().unwrap(), 0);
        assert!(root.join("en/ulb/jud").is_dir());
    }

    #[test]
    fn test_missing_project_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        std::fs::create_dir_all(&root).unwrap();
        let mut transformer = Transformer::new(
            &root,
            "en",
            "ulb",
            Some("jud"),
            Retarget {
                language: Some("fr".into()),
                ..Retarget::default()
            },
        )
        .unwrap();
        assert!(matches!(
            transformer.execute(),
            Err(ConvertError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_backup_keeps_pre_transform_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("recordings");
        let project = root.join("en/ulb/jud");
        std::fs::create_dir_all(&project).unwrap();
        write_take(
            &project.join("en_ulb_b65_jud_c01_v01-05_t01.wav"),
            take_metadata(),
        );

        let mut transformer = Transformer::new(
            &root,
            "en",
            "ulb",
            Some("jud"),
            Retarget {
                language: Some("es".into()),
                language_name: Some("español".into()),
                version: None,
            },
        )
        .unwrap();
        transformer.execute().unwrap();

        let archive = dir.path().join("recordingsArchive");
        let stamp = std::fs::read_dir(&archive).unwrap().next().unwrap().unwrap();
        assert!(stamp
            .path()
            .join("en/ulb/jud/en_ulb_b65_jud_c01_v01-05_t01.wav")
            .is_file());
    }
}
