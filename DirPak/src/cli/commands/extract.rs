//! CLI command for PAK extraction

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, apply, print_done, print_step, simple_bar};
use crate::pak::PakOperations;

pub fn execute(source: &Path, destination: &Path, file: Option<&str>, quiet: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    if let Some(path) = file {
        let written = PakOperations::extract_file(source, path, destination)?;
        if !quiet {
            println!("Extracted {path} -> {}", written.display());
        }
        return Ok(());
    }

    if quiet {
        PakOperations::extract(source, destination)?;
        return Ok(());
    }

    print_step(
        1,
        1,
        DISK,
        &format!("Extracting {} -> {}", source.display(), destination.display()),
    );
    let pb = simple_bar(0, "Reading entry table");
    PakOperations::extract_with_progress(source, destination, &|p| apply(&pb, p))?;
    pb.finish_and_clear();

    print_done(start.elapsed());
    Ok(())
}
