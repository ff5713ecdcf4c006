//! CLI command for listing PAK contents

use std::path::Path;

use crate::pak::PakOperations;

/// Simple glob pattern matching (supports * and ?)
fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_from(&pattern_chars, &text_chars)
}

fn matches_glob_from(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'*', rest)) => (0..=text.len()).any(|skip| matches_glob_from(rest, &text[skip..])),
        Some((&'?', rest)) => !text.is_empty() && matches_glob_from(rest, &text[1..]),
        Some((c, rest)) => text
            .first()
            .is_some_and(|t| t.eq_ignore_ascii_case(c) && matches_glob_from(rest, &text[1..])),
    }
}

/// Match against the entry name or its full path
fn matches_entry(pattern: &str, path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    matches_glob(pattern, name) || matches_glob(pattern, path)
}

/// Format byte size for human-readable output
pub(crate) fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}K", bytes as f64 / 1024.0)
    } else {
        format!("{bytes}")
    }
}

pub fn execute(source: &Path, detailed: bool, filter: Option<&str>, count: bool) -> anyhow::Result<()> {
    if !detailed {
        let paths = PakOperations::list(source)?;
        let filtered: Vec<_> = paths
            .iter()
            .filter(|p| filter.is_none_or(|pattern| matches_entry(pattern, p)))
            .collect();

        if count {
            println!("{}", filtered.len());
        } else {
            for path in filtered {
                println!("{path}");
            }
        }
        return Ok(());
    }

    let entries = PakOperations::list_detailed(source)?;
    let filtered: Vec<_> = entries
        .iter()
        .filter(|e| filter.is_none_or(|pattern| matches_entry(pattern, &e.path)))
        .collect();

    if count {
        println!("{}", filtered.len());
        return Ok(());
    }

    println!("{:>6}  {:>10}  {:>10}  {:>6}  PATH", "ID", "SIZE", "STORED", "RATIO");
    for entry in &filtered {
        if entry.is_dir {
            println!(
                "{:>6}  {:>10}  {:>10}  {:>6}  {}/",
                entry.file_id,
                format!("{} items", entry.size),
                "-",
                "-",
                entry.path
            );
            continue;
        }
        let ratio = if entry.size > 0 {
            entry.stored_size as f64 / entry.size as f64 * 100.0
        } else {
            100.0
        };
        println!(
            "{:>6}  {:>10}  {:>10}  {:>5.1}%  {}{}",
            entry.file_id,
            format_size(entry.size),
            format_size(entry.stored_size),
            ratio,
            entry.path,
            if entry.compressed { "" } else { " (stored)" }
        );
    }

    let files: Vec<_> = filtered.iter().filter(|e| !e.is_dir).collect();
    let total: u64 = files.iter().map(|e| e.size).sum();
    let stored: u64 = files.iter().map(|e| e.stored_size).sum();
    println!();
    println!(
        "{} files, {} total ({} stored)",
        files.len(),
        format_size(total),
        format_size(stored)
    );

    Ok(())
}
