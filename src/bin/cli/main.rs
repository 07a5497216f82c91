//! Command-line tool for VARC archive operations.

mod commands;
mod exit_codes;
mod password;
mod progress;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Secure multi-file archive tool (VARC format)
#[derive(Parser)]
#[command(name = "varc")]
#[command(author, version, about = "Secure multi-file archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Password for encryption or decryption
    #[arg(short = 'p', long, global = true)]
    password: Option<String>,

    /// Suppress progress output
    #[arg(short = 'q', long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive (aliases: c, pack)
    #[command(aliases = ["c", "pack"])]
    Create {
        /// Archive file to create
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Encrypt the archive with a password
        #[arg(short = 'e', long)]
        encrypt: bool,

        /// Disable compression
        #[arg(long)]
        no_compress: bool,

        /// Compression level (0-9)
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
        compress_level: u32,
    },

    /// Extract files from an archive (aliases: x, unpack)
    #[command(aliases = ["x", "unpack"])]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory (defaults to the current directory)
        output: Option<PathBuf>,

        /// Overwrite existing files
        #[arg(short = 'o', long)]
        overwrite: bool,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Raw output: paths and exact byte sizes only
        #[arg(long)]
        raw: bool,

        /// Show entry checksums
        #[arg(long)]
        checksums: bool,
    },

    /// Verify archive integrity (alias: v)
    #[command(alias = "v")]
    Verify {
        /// Archive file to verify
        archive: PathBuf,
    },

    /// Add files to an existing archive (alias: a)
    #[command(alias = "a")]
    Add {
        /// Archive file to modify
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Disable compression
        #[arg(long)]
        no_compress: bool,

        /// Compression level (0-9)
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
        compress_level: u32,
    },

    /// Remove entries matching patterns (alias: rm)
    #[command(alias = "rm")]
    Remove {
        /// Archive file to modify
        archive: PathBuf,

        /// Glob patterns (`*`, `?`) of entries to remove
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Encrypt an archive with a password
    Lock {
        /// Archive file to lock
        archive: PathBuf,
    },

    /// Decrypt a locked archive
    Unlock {
        /// Archive file to unlock
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Create {
            archive,
            inputs,
            encrypt,
            no_compress,
            compress_level,
        } => commands::create(&commands::CreateConfig {
            archive: &archive,
            inputs: &inputs,
            encrypt,
            compress: !no_compress,
            level: compress_level,
            password: cli.password,
            quiet: cli.quiet,
        }),

        Commands::Extract {
            archive,
            output,
            overwrite,
        } => commands::extract(
            &archive,
            output.as_deref().unwrap_or_else(|| std::path::Path::new(".")),
            overwrite,
            cli.password,
            cli.quiet,
        ),

        Commands::List {
            archive,
            raw,
            checksums,
        } => commands::list(&archive, raw, checksums, cli.password),

        Commands::Verify { archive } => commands::verify(&archive, cli.password, cli.quiet),

        Commands::Add {
            archive,
            inputs,
            no_compress,
            compress_level,
        } => commands::add(&commands::AddConfig {
            archive: &archive,
            inputs: &inputs,
            compress: !no_compress,
            level: compress_level,
            password: cli.password,
            quiet: cli.quiet,
        }),

        Commands::Remove { archive, patterns } => {
            commands::remove(&archive, &patterns, cli.password)
        }

        Commands::Lock { archive } => commands::lock(&archive, cli.password),

        Commands::Unlock { archive } => commands::unlock(&archive, cli.password),
    };

    std::process::exit(exit_code.code());
}
