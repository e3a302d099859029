//! Main entry point for the rgma CLI application.
//!
//! This binary lists and extracts GMA addons from both the local
//! filesystem and remote HTTP URLs.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rgma::{Addon, AddonExtractor, Cli, HttpRangeReader, LocalFileReader, ReadAt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_target(false)
        .format_timestamp(None)
        .init();

    if cli.is_http_url() {
        let reader = HttpRangeReader::new(cli.file.clone()).await?;
        let transferred_before = reader.transferred_bytes();
        let reader = Arc::new(reader);

        process_addon(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = Arc::new(LocalFileReader::new(Path::new(&cli.file))?);
        process_addon(reader, &cli).await?;
    }

    Ok(())
}

/// Parse the addon, then list, pipe or extract it depending on the flags.
async fn process_addon<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let extractor = AddonExtractor::new(reader).confine_paths(cli.confine);
    let addon = extractor.parse().await?;

    if cli.list || cli.verbose {
        list_files(&addon, cli.verbose);
        return Ok(());
    }

    if cli.pipe {
        return pipe_files(&extractor, &addon, &cli.files).await;
    }

    let dest = cli
        .extract_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    if !cli.is_quiet() {
        println!(
            "Extracting {} ({} files, {}) to {}",
            addon.name,
            addon.files.len(),
            format_size(addon.total_size()),
            dest.display()
        );
    }

    extractor.extract(&addon, &dest).await?;
    Ok(())
}

/// Print the file table, with addon metadata and sizes when verbose.
fn list_files(addon: &Addon, verbose: bool) {
    if !verbose {
        for entry in &addon.files {
            println!("{}", entry.name);
        }
        return;
    }

    println!("Name:        {}", addon.name);
    println!("Author:      {} ({})", addon.author, addon.author_steam_id);
    println!("Updated:     {}", format_timestamp(addon.timestamp));
    println!("Format:      v{}", addon.format_version);
    println!("Version:     {}", addon.version);
    if let Some(addon_type) = addon.addon_type {
        println!("Type:        {}", addon_type);
    }
    if !addon.tags.is_empty() {
        let tags: Vec<_> = addon.tags.iter().map(|t| t.as_str()).collect();
        println!("Tags:        {}", tags.join(", "));
    }
    if !addon.required_content.is_empty() {
        println!("Requires:    {}", addon.required_content);
    }
    if !addon.description.is_empty() {
        println!("Description: {}", addon.description);
    }
    println!();

    println!("{:>10}  {:>8}  {:>10}  Name", "Length", "CRC", "Offset");
    println!("{}", "-".repeat(70));
    for entry in &addon.files {
        println!(
            "{:>10}  {:08x}  {:>10}  {}",
            entry.size, entry.crc, entry.relative_offset, entry.name
        );
    }
    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>8}  {:>10}  {} files",
        addon.total_size(),
        "",
        "",
        addon.files.len()
    );
}

/// Write the named files, or every file, to stdout in table order.
async fn pipe_files<R: ReadAt + 'static>(
    extractor: &AddonExtractor<R>,
    addon: &Addon,
    names: &[String],
) -> Result<()> {
    if names.is_empty() {
        for entry in &addon.files {
            extractor.extract_to_stdout(addon, entry).await?;
        }
        return Ok(());
    }

    for name in names {
        let Some(entry) = addon.find_file(name) else {
            bail!("{}: not found in addon", name);
        };
        extractor.extract_to_stdout(addon, entry).await?;
    }
    Ok(())
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
