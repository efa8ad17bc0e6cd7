//! Configs command - list the configuration files in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

fn describe(file_name: &str) -> &'static str {
    match file_name {
        "default_config.yml" => "Base configuration (not for direct use)",
        "europe_config.yml" => "European 7-country processing",
        "spain_config.yml" => "Spain-specific processing",
        _ => "Custom configuration",
    }
}

fn is_yaml(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e == "yml" || e == "yaml")
            .unwrap_or(false)
}

pub fn run(dir: PathBuf, _verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Configuration directory not found: {}", dir.display()).into());
    }

    let mut files: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_yaml(path))
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    files.sort();

    println!(
        "{} {}",
        "Configurations in".cyan().bold(),
        dir.display().to_string().white()
    );
    println!();

    if files.is_empty() {
        println!("  {}", "No configuration files found".yellow());
        return Ok(());
    }

    for name in &files {
        println!("  {} {}", format!("{:<24}", name).white().bold(), describe(name));
    }
    println!();
    println!(
        "Run {} to process one.",
        format!("tyrefacts run {}/<file>", dir.display())
            .cyan()
            .bold()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_descriptions() {
        assert_eq!(describe("spain_config.yml"), "Spain-specific processing");
        assert_eq!(describe("nordics.yml"), "Custom configuration");
    }

    #[test]
    fn test_yaml_filter() {
        let dir = tempfile::TempDir::new().unwrap();
        let yml = dir.path().join("a.yml");
        let txt = dir.path().join("b.txt");
        fs::write(&yml, "").unwrap();
        fs::write(&txt, "").unwrap();

        assert!(is_yaml(&yml));
        assert!(!is_yaml(&txt));
        assert!(!is_yaml(&dir.path().join("missing.yaml")));
    }
}
