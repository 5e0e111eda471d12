use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use po_translator::{PoFileMerger, PoFileSplitter, TranslateRequest};

#[derive(Parser, Debug)]
#[command(
    name = "po-translator",
    version,
    about = "Batch-translate gettext .po/.pot catalogs"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a single catalog or every catalog in a folder
    Translate {
        /// Input .po/.pot file
        #[arg(short = 'f', long = "file", conflicts_with = "folder")]
        file: Option<PathBuf>,

        /// Folder containing .po/.pot files
        #[arg(short = 'd', long = "folder", required_unless_present = "file")]
        folder: Option<PathBuf>,

        /// Output folder for translated catalogs
        #[arg(short = 'o', long = "output", default_value = "output")]
        output: PathBuf,

        /// Configuration file (default: ~/.po-translator/config.json)
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Number of concurrent translation workers
        #[arg(short = 'j', long = "jobs", default_value_t = num_cpus::get())]
        jobs: usize,

        /// Overwrite outputs that already exist
        #[arg(short = 'F', long = "force")]
        force: bool,

        /// Bypass the on-disk translation cache
        #[arg(long = "no-cache")]
        no_cache: bool,

        /// Write outputs in the Odoo module layout (<stem>/i18n/<lang>.po)
        #[arg(short = 'O', long = "odoo")]
        odoo: bool,
    },
    /// Split the untranslated entries of a catalog into numbered parts
    Split {
        /// Input .po/.pot file
        file: PathBuf,

        /// Number of parts to produce
        #[arg(short = 'n', long = "parts", default_value_t = 2)]
        parts: usize,

        /// Output folder for the part files
        #[arg(short = 'o', long = "output", default_value = "output")]
        output: PathBuf,
    },
    /// Merge a folder of catalogs back into a single file
    Merge {
        /// Folder to scan recursively for .po files
        folder: PathBuf,

        /// Merged output file
        #[arg(short = 'o', long = "output", default_value = "merged.po")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    po_translator::logging::init(cli.verbose)?;
    spawn_signal_watcher();

    match cli.command {
        Command::Translate {
            file,
            folder,
            output,
            config,
            jobs,
            force,
            no_cache,
            odoo,
        } => {
            po_translator::run_translate(TranslateRequest {
                file_path: file,
                folder_path: folder,
                output_folder: output,
                config_path: config,
                jobs,
                force,
                no_cache,
                odoo_output: odoo,
            })
            .await
        }
        Command::Split {
            file,
            parts,
            output,
        } => {
            PoFileSplitter::new(file, parts, output).split()?;
            Ok(())
        }
        Command::Merge { folder, output } => {
            PoFileMerger::new(folder, output).merge()?;
            Ok(())
        }
    }
}

/// Ctrl-C ends the run immediately; in-flight requests are abandoned and the
/// cache keeps whatever was already written.
fn spawn_signal_watcher() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, exiting");
            std::process::exit(130);
        }
    });
}
