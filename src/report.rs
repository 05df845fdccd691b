use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::warn;

use crate::model::tree::TreeNode;

const UL_OPEN: &str = "<ul>";
const UL_CLOSE: &str = "</ul>";
const LI_OPEN: &str = "<li>";
const LI_CLOSE: &str = "</li>";
const OPEN_ROOT: &str = "<a id=\"root\" class=\"label\">";
const OPEN_ISSUE: &str = "<a class=\"label\"><span class=\"issue fa fa-check-square\"></span> ";
const OPEN_FOLDER: &str = "<a class=\"label\"><span class=\"folder fa fa-folder\"></span> ";
const CLOSE_A: &str = "</a>";
const FONT_AWESOME: &str = "<link rel=\"stylesheet\" href=\"https://maxcdn.bootstrapcdn.com/font-awesome/4.5.0/css/font-awesome.min.css\">";
const STYLE: &str = "<style>body{font-family:sans-serif}ul{list-style:none}.folder{color:#b8860b}.issue{color:#2a6}</style>";
const HEAD: &str = "<head><meta charset=\"UTF-8\"><title>Expected Tree</title></head>";
const HEADER: &str =
    "<header><h1>Requirements Tree Migration to Azure DevOps</h1><h2>Expected tree</h2></header>";

/// Render the depth-first-ordered node list as a nested list, the way the
/// destination will show the tree after a real run.
pub fn render_expected_tree(nodes: &[TreeNode], project: &str) -> String {
    let mut html = format!("<html><body>{HEAD}{HEADER}{UL_OPEN}{LI_OPEN}{OPEN_ROOT}{project}{CLOSE_A}");
    let mut current_level = 0u32;

    for node in nodes {
        let label = if node.is_folder() { OPEN_FOLDER } else { OPEN_ISSUE };
        let entry = format!("{label}{}{CLOSE_A}", node.title);
        if node.level == current_level {
            html.push_str(&format!("{LI_CLOSE}{LI_OPEN}{entry}"));
        } else if node.level > current_level {
            html.push_str(&format!("{UL_OPEN}{LI_OPEN}{entry}"));
        } else {
            let close_levels = format!("{LI_CLOSE}{UL_CLOSE}").repeat((current_level - node.level) as usize);
            html.push_str(&format!("{close_levels}{LI_OPEN}{entry}"));
        }
        current_level = node.level;
    }

    html.push_str(&format!("{LI_CLOSE}{UL_CLOSE}").repeat((current_level + 1) as usize));
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S");
    html.push_str(&format!(
        "<footer>Generated {generated}</footer>{STYLE}{FONT_AWESOME}</body></html>"
    ));
    html
}

pub fn write_expected_tree(dir: &Path, nodes: &[TreeNode], project: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report dir {}", dir.display()))?;
    let path = dir.join("expected_tree.html");
    std::fs::write(&path, render_expected_tree(nodes, project))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Best effort: the migration result does not depend on the report opening.
pub fn open_in_browser(path: &Path) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    if let Err(err) = std::process::Command::new(opener).arg(path).spawn() {
        warn!(error = %err, "Could not open the report in a browser");
    }
}
