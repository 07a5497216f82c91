//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use varc::{Archive, CreateOptions, Error, ExtractOptions, ListOptions, Password};

use crate::exit_codes::ExitCode;
use crate::password::{confirm_password, get_password};
use crate::progress::CliProgress;

/// Configuration for the `create` command.
pub struct CreateConfig<'a> {
    pub archive: &'a Path,
    pub inputs: &'a [PathBuf],
    pub encrypt: bool,
    pub compress: bool,
    pub level: u32,
    pub password: Option<String>,
    pub quiet: bool,
}

/// Configuration for the `add` command.
pub struct AddConfig<'a> {
    pub archive: &'a Path,
    pub inputs: &'a [PathBuf],
    pub compress: bool,
    pub level: u32,
    pub password: Option<String>,
    pub quiet: bool,
}

/// Opens an archive, prompting for a password when it turns out to be
/// encrypted and none was supplied.
fn open_archive(path: &Path, provided: Option<String>) -> Result<Archive, ExitCode> {
    let password = provided.map(Password::new);
    match Archive::open(path, password.as_ref()) {
        Ok(archive) => Ok(archive),
        Err(Error::PasswordRequired) => {
            let prompted = match get_password(None) {
                Some(p) => p,
                None => {
                    eprintln!("Error: password required for encrypted archive");
                    return Err(ExitCode::Error);
                }
            };
            Archive::open(path, Some(&prompted)).map_err(|e| {
                eprintln!("Error: failed to open archive: {}", e);
                ExitCode::Error
            })
        }
        Err(e) => {
            eprintln!("Error: failed to open archive: {}", e);
            Err(ExitCode::Error)
        }
    }
}

fn build_options(
    compress: bool,
    level: u32,
    password: Option<Password>,
) -> Result<CreateOptions, ExitCode> {
    let mut options = CreateOptions::new().compress(compress);
    options = options.level(level).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::Error
    })?;
    if let Some(password) = password {
        options = options.encrypt(password);
    }
    Ok(options)
}

fn report_failures(failures: &[(String, Error)]) {
    for (path, error) in failures {
        eprintln!("  {}: {}", path, error);
    }
}

pub fn create(config: &CreateConfig<'_>) -> ExitCode {
    let password = if config.encrypt {
        match confirm_password(config.password.clone()) {
            Some(p) => Some(p),
            None => return ExitCode::Error,
        }
    } else {
        None
    };

    let options = match build_options(config.compress, config.level, password) {
        Ok(o) => o,
        Err(code) => return code,
    };

    let mut archive = Archive::create(config.archive);
    let mut progress = CliProgress::new(config.quiet);
    let result = archive.add_files_with_progress(config.inputs, &options, &mut progress);
    progress.finish();

    if !result.ok {
        eprintln!("Warning: some inputs were not added:");
        report_failures(&result.failures);
    }

    if let Err(e) = archive.save() {
        eprintln!("Error: failed to save archive: {}", e);
        return ExitCode::Error;
    }

    if !config.quiet {
        println!("Created: {}", config.archive.display());
        println!("Files: {}", result.entries_processed);
        println!("Size: {:.2} KB", result.bytes_processed as f64 / 1024.0);
        if config.encrypt {
            println!("Encryption: AES-256-CBC");
        }
    }

    if result.ok {
        ExitCode::Success
    } else {
        ExitCode::Error
    }
}

pub fn extract(
    archive_path: &Path,
    output: &Path,
    overwrite: bool,
    password: Option<String>,
    quiet: bool,
) -> ExitCode {
    let mut archive = match open_archive(archive_path, password) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let options = ExtractOptions::new().overwrite(overwrite);
    let mut progress = CliProgress::new(quiet);
    let result = archive.extract_all_with_progress(output, None, &options, &mut progress);
    progress.finish();

    let result = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: extraction failed: {}", e);
            return ExitCode::Error;
        }
    };

    if !result.ok {
        eprintln!("Warning: some entries were not extracted:");
        report_failures(&result.failures);
    }

    if !quiet {
        println!("Extracted: {} files", result.entries_extracted);
        if result.entries_skipped > 0 {
            println!("Skipped: {} (use --overwrite to replace)", result.entries_skipped);
        }
        println!("Output: {}", output.display());
    }

    if result.ok {
        ExitCode::Success
    } else {
        ExitCode::Error
    }
}

pub fn list(archive_path: &Path, raw: bool, checksums: bool, password: Option<String>) -> ExitCode {
    let archive = match open_archive(archive_path, password) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let options = if raw {
        ListOptions::raw()
    } else {
        ListOptions::new().checksums(checksums)
    };
    print!("{}", archive.list(&options));
    ExitCode::Success
}

pub fn verify(archive_path: &Path, password: Option<String>, quiet: bool) -> ExitCode {
    let mut archive = match open_archive(archive_path, password) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if !quiet {
        match archive.verification_report(None) {
            Ok(report) => println!("{}", report),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::Error;
            }
        }
    }

    match archive.verify(None) {
        Ok(()) => {
            println!("Status: VERIFIED");
            ExitCode::Success
        }
        Err(e) => {
            println!("Status: FAILED");
            eprintln!("Error: {}", e);
            ExitCode::VerifyFailed
        }
    }
}

pub fn add(config: &AddConfig<'_>) -> ExitCode {
    let mut archive = match open_archive(config.archive, config.password.clone()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Keep encrypting when adding to an archive opened with a password.
    let password = config
        .password
        .as_ref()
        .filter(|_| archive.header().is_encrypted())
        .map(|p| Password::new(p.clone()));

    let options = match build_options(config.compress, config.level, password) {
        Ok(o) => o,
        Err(code) => return code,
    };

    let mut progress = CliProgress::new(config.quiet);
    let result = archive.add_files_with_progress(config.inputs, &options, &mut progress);
    progress.finish();

    if !result.ok {
        eprintln!("Warning: some inputs were not added:");
        report_failures(&result.failures);
    }

    if let Err(e) = archive.save() {
        eprintln!("Error: failed to save archive: {}", e);
        return ExitCode::Error;
    }

    if !config.quiet {
        println!("Added {} files to archive", result.entries_processed);
    }

    if result.ok {
        ExitCode::Success
    } else {
        ExitCode::Error
    }
}

pub fn remove(archive_path: &Path, patterns: &[String], password: Option<String>) -> ExitCode {
    let mut archive = match open_archive(archive_path, password) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut removed = 0;
    for pattern in patterns {
        removed += archive.remove_entries(pattern);
    }

    if let Err(e) = archive.save() {
        eprintln!("Error: failed to save archive: {}", e);
        return ExitCode::Error;
    }

    println!("Removed {} entries from archive", removed);
    ExitCode::Success
}

pub fn lock(archive_path: &Path, password: Option<String>) -> ExitCode {
    let password = match confirm_password(password) {
        Some(p) => p,
        None => return ExitCode::Error,
    };

    let mut archive = match open_archive(archive_path, None) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = archive.lock(&password) {
        eprintln!("Error: failed to lock archive: {}", e);
        return ExitCode::Error;
    }
    if let Err(e) = archive.save() {
        eprintln!("Error: failed to save archive: {}", e);
        return ExitCode::Error;
    }

    println!("Archive locked successfully");
    ExitCode::Success
}

pub fn unlock(archive_path: &Path, password: Option<String>) -> ExitCode {
    let password = match get_password(password) {
        Some(p) => p,
        None => {
            eprintln!("Error: password required");
            return ExitCode::Error;
        }
    };

    let mut archive = match Archive::open(archive_path, Some(&password)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: failed to open archive: {}", e);
            return ExitCode::Error;
        }
    };

    if let Err(e) = archive.unlock(&password) {
        eprintln!("Error: failed to unlock archive: {}", e);
        return ExitCode::Error;
    }
    if let Err(e) = archive.save() {
        eprintln!("Error: failed to save archive: {}", e);
        return ExitCode::Error;
    }

    println!("Archive unlocked successfully");
    ExitCode::Success
}
