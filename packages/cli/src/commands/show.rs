use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_common::{walk_node, DocumentTree, ImageAttrs, Node, Visitor};
use folio_editor::Document;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document to print
    #[arg(default_value = "document.json")]
    pub doc: String,
}

pub fn show(args: ShowArgs, cwd: &Path) -> Result<()> {
    let document = Document::load(cwd.join(&args.doc))?;

    println!("{} {}", "📄".bright_blue(), args.doc.bright_white().bold());
    let lines = outline(document.tree());
    if lines.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for line in lines {
        println!("{}", line);
    }

    Ok(())
}

/// One indented line per node, depth-first
pub fn outline(tree: &DocumentTree) -> Vec<String> {
    let mut printer = OutlinePrinter { lines: Vec::new() };
    printer.visit_tree(tree);
    printer.lines
}

struct OutlinePrinter {
    lines: Vec<String>,
}

impl Visitor for OutlinePrinter {
    fn visit_node(&mut self, node: &Node, path: &[usize]) {
        let indent = "  ".repeat(path.len());
        let line = match node {
            Node::Paragraph { text, .. } => format!("¶ {}", text),
            Node::Heading { level, text, .. } => format!("{} {}", "#".repeat(*level as usize), text),
            Node::Blockquote { children, .. } => format!("> quote ({} blocks)", children.len()),
            Node::Image { attrs, .. } => format!("🖼  {}", describe_image(attrs)),
            Node::Embed { url, .. } => format!("▶ {}", url),
        };
        self.lines.push(format!("{}{}", indent, line));
        walk_node(self, node, path);
    }
}

fn describe_image(attrs: &ImageAttrs) -> String {
    if let Some(error) = &attrs.error {
        format!("{} {}", "failed:".red(), error)
    } else if attrs.loading {
        format!("{}", "uploading…".yellow())
    } else {
        attrs.src.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_nests_quotes() {
        colored::control::set_override(false);

        let tree = DocumentTree::from_blocks(vec![
            Node::heading(2, "Trip"),
            Node::blockquote(vec![Node::paragraph("inside")]),
            Node::image(ImageAttrs::new("file:///tmp/a.png")),
        ]);

        assert_eq!(
            outline(&tree),
            vec![
                "  ## Trip",
                "  > quote (1 blocks)",
                "    ¶ inside",
                "  🖼  file:///tmp/a.png",
            ]
        );
    }

    #[test]
    fn test_outline_marks_failed_images() {
        colored::control::set_override(false);

        let attrs = ImageAttrs {
            error: Some("Failed to upload image".to_string()),
            ..ImageAttrs::new("blob:folio/1")
        };
        let tree = DocumentTree::from_blocks(vec![Node::image(attrs)]);

        assert_eq!(outline(&tree), vec!["  🖼  failed: Failed to upload image"]);
    }
}
