//! CLI command for PAK creation

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{PACKAGE, apply, print_done, print_step, simple_spinner};
use crate::pak::{BuildOptions, Endianness, PakOperations};

/// Flags that override the build options
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateArgs<'a> {
    pub no_compress: bool,
    pub level: Option<u32>,
    pub big_endian: bool,
    pub config: Option<&'a Path>,
}

impl CreateArgs<'_> {
    /// Build options from the config file (if any) with flags applied on top
    pub fn to_options(&self) -> crate::error::Result<BuildOptions> {
        let mut options = match self.config {
            Some(path) => BuildOptions::from_json_file(path)?,
            None => BuildOptions::default(),
        };
        if self.no_compress {
            options = options.with_compression(false);
        }
        if let Some(level) = self.level {
            options = options.with_compression_level(level);
        }
        if self.big_endian {
            options = options.with_endianness(Endianness::Big);
        }
        options.validate()?;
        Ok(options)
    }
}

pub fn execute(source: &Path, destination: &Path, args: &CreateArgs, quiet: bool) -> anyhow::Result<()> {
    let options = args.to_options()?;
    let start = Instant::now();

    if quiet {
        PakOperations::create_with_options(source, destination, &options)?;
        return Ok(());
    }

    print_step(
        1,
        1,
        PACKAGE,
        &format!("Packing {} -> {}", source.display(), destination.display()),
    );

    let pb = simple_spinner("Scanning...");
    let summary =
        PakOperations::create_with_progress(source, destination, &options, &|p| apply(&pb, p))?;
    pb.finish_and_clear();

    let ratio = if summary.raw_bytes > 0 {
        summary.stored_bytes as f64 / summary.raw_bytes as f64 * 100.0
    } else {
        100.0
    };
    println!(
        "  {} entries ({} files, {} directories), {} compressed, {} skipped",
        summary.entry_count,
        summary.file_count,
        summary.directory_count,
        summary.compressed_count,
        summary.skipped_count
    );
    println!(
        "  {} -> {} bytes ({ratio:.1}%), archive {} bytes ({} endian)",
        summary.raw_bytes,
        summary.stored_bytes,
        summary.archive_size,
        options.endianness.as_str()
    );
    print_done(start.elapsed());
    Ok(())
}
