//! Batch conversion of takes recorded under older naming and metadata
//! conventions. Projects are discovered by walking a recording tree laid
//! out as `<root>/<language>/<version>/<book>`, archived, and then every
//! take gets its metadata filled in and, for legacy names, the file
//! renamed to the current convention.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{info, warn};

use crate::books::BookRegistry;
use crate::chunks::ChunkStore;
use crate::error::{ConvertError, Result};
use crate::filename;
use crate::fsops;
use crate::infer;
use crate::types::{Grammar, Mode, Project};
use crate::wav::WavFile;

pub struct Converter {
    root: PathBuf,
    stamp_dir: PathBuf,
    chunks: ChunkStore,
    projects: Vec<Project>,
}

impl Converter {
    /// `root` is the directory holding the recording tree. The archive
    /// lands next to it as `<root>Archive/<timestamp>/`.
    pub fn new(root: impl Into<PathBuf>, chunks: ChunkStore) -> Result<Converter> {
        let root: PathBuf = root.into();
        if !root.is_dir() {
            return Err(ConvertError::InvalidInput(format!(
                "source directory {} doesn't exist",
                root.display()
            )));
        }
        let archive_dir = archive_dir_for(&root);
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        Ok(Converter {
            root,
            stamp_dir: archive_dir.join(stamp),
            chunks,
            projects: Vec::new(),
        })
    }

    /// Walk the tree and group takes into projects, detecting each
    /// project's current mode and whether any of its takes still have
    /// incomplete metadata.
    pub fn analyze(&mut self) -> Result<()> {
        for take in fsops::wav_takes(&self.root)? {
            let name = match take.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            let parts: Vec<&str> = name.split('_').collect();
            let language = parts.first().copied().unwrap_or("");
            let version = parts.get(1).copied().unwrap_or("");
            let book = match parts.get(2) {
                Some(part) if part.starts_with('b') && parts.len() > 3 => parts[3],
                Some(part) => part,
                None => "",
            };
            if language.is_empty() || version.is_empty() || book.is_empty() {
                continue;
            }
            if self.find_project(language, version, book).is_some() {
                continue;
            }

            let mode = detect_mode(&take);
            let should_fix = has_bad_metadata(&take);
            self.projects.push(Project {
                mode,
                language: language.to_string(),
                version: version.to_string(),
                book: book.to_string(),
                should_fix,
                should_update: false,
            });
        }
        Ok(())
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn projects_mut(&mut self) -> &mut [Project] {
        &mut self.projects
    }

    /// Apply a recording mode to every project. Passing `Some` overrides
    /// whatever mode was detected; `None` keeps the detected modes. A
    /// project whose mode changes gets all its takes restamped.
    pub fn set_mode(&mut self, mode: Option<Mode>) {
        for project in &mut self.projects {
            let previous = project.mode;
            if mode.is_some() {
                project.mode = mode;
            }
            if project.mode != previous {
                project.should_update = true;
            }
            if project.mode.is_none() {
                warn!("no mode known for project {project}; it will be skipped");
            }
        }
    }

    /// Archive the affected projects, then fix every take in them.
    /// Returns how many files were affected. A failed backup aborts
    /// before anything is mutated.
    pub fn execute(&mut self) -> Result<usize> {
        self.create_backup()?;

        let registry = BookRegistry::bundled();
        let mut counter = 0;

        for project in &mut self.projects {
            if !(project.should_fix || project.should_update) {
                continue;
            }
            let Some(mode) = project.mode else {
                warn!("skipping project {project}: no mode selected");
                continue;
            };

            let project_dir = project_dir(&self.root, project);
            if !project_dir.is_dir() {
                warn!("project directory {} does not exist", project_dir.display());
                continue;
            }
            for take in fsops::wav_takes(&project_dir)? {
                let name = take
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let mut wav = match WavFile::open(&take) {
                    Ok(wav) => wav,
                    Err(e) => {
                        warn!("skipping {}: {e}", take.display());
                        continue;
                    }
                };

                let id = filename::parse(&name);
                if !id.matched {
                    info!("skipping {name}: matches neither naming convention");
                    continue;
                }

                infer::update_metadata(wav.metadata_mut(), &id, mode, registry, &self.chunks);
                if let Err(e) = wav.commit() {
                    warn!("failed to write metadata to {}: {e}", take.display());
                    continue;
                }

                // Legacy-named files migrate to the current convention;
                // current names are left in place.
                if id.grammar == Grammar::Legacy {
                    let new_name = infer::canonical_file_name(wav.metadata(), id.take, mode);
                    std::fs::rename(&take, take.with_file_name(&new_name))?;
                    info!("renamed {name} -> {new_name}");
                }
                counter += 1;
            }

            project.should_fix = false;
            project.should_update = false;
        }

        info!("conversion complete: {counter} file(s) affected");
        Ok(counter)
    }

    fn find_project(&self, language: &str, version: &str, book: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.language == language && p.version == version && p.book == book)
    }

    fn create_backup(&self) -> Result<()> {
        for project in &self.projects {
            if !(project.should_fix || project.should_update) {
                continue;
            }
            let project_dir = project_dir(&self.root, project);
            if !project_dir.is_dir() {
                warn!("project directory {} does not exist", project_dir.display());
                continue;
            }
            let dest = self
                .stamp_dir
                .join(&project.language)
                .join(&project.version)
                .join(&project.book);
            fsops::copy_dir_recursive(&project_dir, &dest)?;
        }
        Ok(())
    }
}

fn project_dir(root: &Path, project: &Project) -> PathBuf {
    root.join(&project.language)
        .join(&project.version)
        .join(&project.book)
}

/// `/path/to/recordings` archives into `/path/to/recordingsArchive`.
fn archive_dir_for(root: &Path) -> PathBuf {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    root.with_file_name(format!("{name}Archive"))
}

fn detect_mode(take: &Path) -> Option<Mode> {
    match WavFile::open(take) {
        Ok(wav) => wav.metadata().mode.parse().ok(),
        Err(e) => {
            warn!("could not read {}: {e}", take.display());
            None
        }
    }
}

fn has_bad_metadata(take: &Path) -> bool {
    match WavFile::open(take) {
        Ok(wav) => !wav.metadata().is_complete(),
        Err(_) => true,
    }
}
