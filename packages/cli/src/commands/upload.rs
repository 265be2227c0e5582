use crate::config::Config;
use crate::uploader::DirectoryUploader;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_common::Position;
use folio_editor::{Document, SharedDocument};
use folio_upload::{
    upload_images_from, MediaFile, ProgressTracker, Status, StatusSnapshot, UploadQueue,
    UploadSource,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Image files to insert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Document to insert into
    #[arg(short, long, default_value = "document.json")]
    pub doc: String,

    /// Block index the first image is inserted at (defaults to the end)
    #[arg(long)]
    pub at: Option<usize>,

    /// Upload directory (overrides config)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Concurrent uploads (overrides config)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-file byte cap (overrides config)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Re-encode oversized images instead of rejecting them
    #[arg(long)]
    pub force_reduce: bool,
}

pub async fn upload(args: UploadArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut queue_config = config.upload.clone();
    if let Some(max_concurrent) = args.max_concurrent {
        queue_config.max_concurrent = max_concurrent;
    }
    if args.max_size.is_some() {
        queue_config.max_size = args.max_size;
    }
    if args.force_reduce {
        queue_config.force_reduce_size = true;
    }
    // Every file named on the command line counts as one gesture
    queue_config.max_files_per_drop = 0;

    let doc_path = cwd.join(&args.doc);
    let document = Document::load(&doc_path)
        .with_context(|| format!("Cannot open {} (run `folio init` first)", args.doc))?;
    let index = args.at.unwrap_or(document.tree().blocks.len());
    let document = Arc::new(SharedDocument::new(document));

    let dest = args.dest.unwrap_or_else(|| config.get_upload_dir(cwd));
    let uploader = Arc::new(DirectoryUploader::new(dest));

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let path = cwd.join(path);
        let file = MediaFile::from_path(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;
        files.push(file);
    }

    let queue = UploadQueue::new(document.clone(), queue_config)?;
    let (progress, _) = ProgressTracker::attach(&queue);
    let last_seen: Mutex<HashMap<String, Status>> = Mutex::new(HashMap::new());
    queue.subscribe(move |snapshots| {
        let mut last_seen = last_seen.lock().unwrap_or_else(|e| e.into_inner());
        for snapshot in snapshots {
            if last_seen.get(snapshot.id.as_str()) != Some(&snapshot.status) {
                last_seen.insert(snapshot.id.as_str().to_string(), snapshot.status);
                print_transition(snapshot);
            }
        }
    });

    println!(
        "{}",
        format!("📤 Uploading {} files...", files.len()).bright_blue().bold()
    );
    upload_images_from(
        UploadSource::Picker,
        &queue,
        files,
        Position::root(index),
        uploader,
    )?;
    queue.wait_idle().await;

    let summary = progress.lock().unwrap_or_else(|e| e.into_inner()).summary();
    document.save()?;

    println!();
    if summary.has_failed {
        println!(
            "{} {} uploads failed, placeholders kept in {}",
            "⚠️".yellow(),
            summary.failed_count,
            args.doc.bright_white()
        );
        return Err(anyhow!("{} of {} uploads failed", summary.failed_count, queue.snapshots().len()));
    }

    println!("{}", "✅ Upload complete!".green().bold());
    Ok(())
}

fn print_transition(snapshot: &StatusSnapshot) {
    match snapshot.status {
        Status::Success => {
            let size = match snapshot.compressed_size {
                Some(compressed) => format!("{} → {} bytes", snapshot.original_size, compressed),
                None => format!("{} bytes", snapshot.original_size),
            };
            println!("  {} {} ({})", "✓".green(), snapshot.file_name, size);
        }
        Status::Failed => {
            eprintln!(
                "  {} {} - {}",
                "✗".red(),
                snapshot.file_name,
                snapshot.error.as_deref().unwrap_or_default()
            );
        }
        status => {
            println!("  {} {} {}", "·".dimmed(), snapshot.file_name, status.as_str().dimmed());
        }
    }
}
