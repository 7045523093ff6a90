//! Detect symlink aliases and write the YAML mapping file.

use console::style;

use crate::cli::{Cli, SymlinksArgs};
use crate::config::Config;
use crate::error::Result;
use crate::symlinks::{detect_fs_symlinks, save_symlink_yaml};

use super::scan_with_progress;

/// Run the symlinks command.
pub fn run(cli: &Cli, config: &Config, args: &SymlinksArgs) -> Result<()> {
    let files = scan_with_progress(cli, config)?;

    if !cli.quiet {
        eprintln!("Analyzing {} file paths for symlinks...", files.len());
    }
    let groups = detect_fs_symlinks(files.keys().map(String::as_str));

    if groups.is_empty() {
        println!("No symlink mappings detected.");
        return Ok(());
    }

    println!("Symlink mappings ({} groups):", groups.len());
    for group in &groups {
        println!("  {}", style(&group.canonical).cyan());
        for alias in &group.aliases {
            let method = group
                .detection_methods
                .get(alias)
                .map(String::as_str)
                .unwrap_or("?");
            println!("    {alias} [{method}]");
        }
    }

    save_symlink_yaml(&groups, &args.output)?;
    println!(
        "\nSymlink mappings written to {}",
        style(args.output.display()).bold()
    );
    Ok(())
}
