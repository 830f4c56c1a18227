use anyhow::Result;
use clap::{Parser, Subcommand};
mod auth;
use keepsafe::{Keepsafe, KeyStore, SourceKind, decrypt_file, default_key_path, encrypt_file};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn resolve_keystore(path: Option<PathBuf>) -> Result<KeyStore> {
    let path = match path {
        Some(p) => p,
        None => default_key_path()?,
    };
    Ok(KeyStore::load_or_generate(&path)?)
}

fn source_kind(file: bool) -> SourceKind {
    if file {
        SourceKind::File
    } else {
        SourceKind::Directory
    }
}

#[derive(Debug, Parser)]
#[command(name = "keepsafe")]
#[command(
    version,
    about = "Encrypted file backup and restore with change detection."
)]
struct Cli {
    /// Path to the fixed-key file (generated on first use)
    #[arg(long, global = true, value_name = "PATH", env = "KEEPSAFE_KEY_FILE")]
    key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts new or changed files from a source into a backup directory
    #[command(arg_required_else_help = true)]
    Backup {
        source: PathBuf,
        backup_dir: PathBuf,

        /// Treat the source as a single file instead of a directory
        #[arg(long, default_value_t = false)]
        file: bool,
    },

    /// Decrypts a backup tree into a destination directory
    #[command(arg_required_else_help = true)]
    Restore {
        backup_dir: PathBuf,
        destination: PathBuf,
    },

    /// Lists files that changed since the last backup into a backup directory
    #[command(arg_required_else_help = true)]
    Check {
        source: PathBuf,
        backup_dir: PathBuf,

        /// Treat the source as a single file instead of a directory
        #[arg(long, default_value_t = false)]
        file: bool,
    },

    /// Forgets recorded hashes so the next backup re-encrypts everything
    #[command(arg_required_else_help = true)]
    Reset { backup_dir: PathBuf },

    /// Encrypts a single file under the stored key, no password needed
    #[command(arg_required_else_help = true)]
    Encrypt {
        source: PathBuf,
        output_dir: PathBuf,
    },

    /// Decrypts a stored-key encrypted file
    #[command(arg_required_else_help = true)]
    Decrypt { encrypted: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    match args.command {
        Commands::Backup {
            source,
            backup_dir,
            file,
        } => {
            let password = auth::read_password()?;
            let mut ks = Keepsafe::with_state(&backup_dir)?;
            let summary = ks.backup(&source, &backup_dir, &password, source_kind(file))?;
            if summary.processed == 0 && summary.failed == 0 {
                println!("nothing new to back up ({} unchanged)", summary.skipped);
            } else {
                println!(
                    "backup complete: {} processed, {} skipped unchanged, {} failed",
                    summary.processed, summary.skipped, summary.failed
                );
            }
        }
        Commands::Restore {
            backup_dir,
            destination,
        } => {
            let password = auth::read_password()?;
            let ks = Keepsafe::new();
            let summary = ks.restore(&backup_dir, &destination, &password)?;
            println!(
                "restore complete: {} restored, {} failed",
                summary.restored, summary.failed
            );
        }
        Commands::Check {
            source,
            backup_dir,
            file,
        } => {
            let ks = Keepsafe::with_state(&backup_dir)?;
            let changed = ks.check(&source, source_kind(file))?;
            for path in &changed {
                println!("{}", path.display());
            }
            if changed.is_empty() {
                println!("no changes detected");
            } else {
                println!("{} file(s) changed", changed.len());
            }
        }
        Commands::Reset { backup_dir } => {
            let mut ks = Keepsafe::with_state(&backup_dir)?;
            ks.reset();
            ks.save_state(&backup_dir)?;
            println!("change tracking reset");
        }
        Commands::Encrypt { source, output_dir } => {
            let keys = resolve_keystore(args.key_file)?;
            let target = encrypt_file(&source, &output_dir, &keys)?;
            println!("encrypted to {}", target.display());
        }
        Commands::Decrypt { encrypted, output } => {
            let keys = resolve_keystore(args.key_file)?;
            let target = decrypt_file(&encrypted, &output, &keys)?;
            println!("decrypted to {}", target.display());
        }
    }

    Ok(())
}
