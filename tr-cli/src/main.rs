use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tr_lib::chunks::ChunkStore;
use tr_lib::convert::Converter;
use tr_lib::transform::{Retarget, Transformer};
use tr_lib::Mode;

#[derive(Parser)]
#[command(name = "tr-convert", about = "Normalize metadata in translation-recording take files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fix metadata and filenames for takes recorded by older app versions
    Convert {
        /// Root directory containing <language>/<version>/<book> projects
        dir: PathBuf,

        /// Recording mode to stamp into takes: verse or chunk.
        /// Defaults to each project's mode detected from its metadata.
        #[arg(long)]
        mode: Option<String>,

        /// Directory holding chunk boundary tables
        /// (chunks/<anthology>/<book>/chunks.json); defaults to the
        /// bundled set
        #[arg(long)]
        assets: Option<PathBuf>,

        /// List affected projects without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Change the language and/or version a project is filed under
    Transform {
        /// Root directory containing <language>/<version>/<book> projects
        dir: PathBuf,

        /// Source project language slug (en, ru, es, ...)
        #[arg(long)]
        language: String,

        /// Source project version slug (ulb, udb, reg, ...)
        #[arg(long)]
        version: String,

        /// Source project book slug; omit to transform every book
        #[arg(long)]
        book: Option<String>,

        /// Language slug to change to
        #[arg(long)]
        to_language: Option<String>,

        /// Display name of the target language
        #[arg(long)]
        to_language_name: Option<String>,

        /// Version slug to change to
        #[arg(long)]
        to_version: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            dir,
            mode,
            assets,
            dry_run,
        } => {
            let mode: Option<Mode> = mode.map(|m| {
                m.parse().unwrap_or_else(|e| {
                    eprintln!("{e}");
                    std::process::exit(1);
                })
            });
            let chunks = match assets {
                Some(root) => ChunkStore::with_root(root),
                None => ChunkStore::bundled(),
            };

            let mut converter = Converter::new(&dir, chunks).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            });
            converter.analyze().unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            });
            converter.set_mode(mode);

            if dry_run {
                for project in converter.projects() {
                    println!(
                        "{project}  mode: {}  needs fix: {}  needs update: {}",
                        project
                            .mode
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "?".into()),
                        project.should_fix,
                        project.should_update
                    );
                }
                return;
            }

            let affected = converter.execute().unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            });
            println!("Conversion complete: {affected} file(s) have been affected.");
        }

        Commands::Transform {
            dir,
            language,
            version,
            book,
            to_language,
            to_language_name,
            to_version,
        } => {
            let target = Retarget {
                language: to_language,
                language_name: to_language_name,
                version: to_version,
            };
            let mut transformer =
                Transformer::new(&dir, &language, &version, book.as_deref(), target)
                    .unwrap_or_else(|e| {
                        eprintln!("Error: {e}");
                        std::process::exit(1);
                    });
            let affected = transformer.execute().unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(1);
            });
            println!("Transformation complete: {affected} file(s) have been affected.");
        }
    }
}
