use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::Document;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Document to create
    #[arg(default_value = "document.json")]
    pub doc: String,

    /// Directory uploaded files are copied into
    #[arg(short, long, default_value = "uploads")]
    pub upload_dir: String,

    /// Force overwrite existing config and document
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);
    let doc_path = cwd.join(&args.doc);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Folio workspace...".bright_blue().bold());

    let config = Config {
        upload_dir: args.upload_dir.clone(),
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    if !doc_path.exists() || args.force {
        Document::create(&doc_path).save()?;
        println!("  {} Created {}", "✓".green(), args.doc);
    }

    let upload_dir = config.get_upload_dir(cwd);
    if !upload_dir.exists() {
        fs::create_dir_all(&upload_dir)?;
        println!("  {} Created {}/", "✓".green(), args.upload_dir);
    }

    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: folio upload {} <images...>", args.doc);
    println!("  2. Run: folio show {}", args.doc);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            doc: "notes.json".to_string(),
            upload_dir: "media".to_string(),
            force: false,
        };
        init(args, dir.path()).unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.upload_dir, "media");
        assert!(dir.path().join("media").is_dir());

        let doc = Document::load(dir.path().join("notes.json")).unwrap();
        assert!(doc.tree().is_empty());
    }
}
