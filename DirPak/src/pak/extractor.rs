// extractor.rs
use super::operations::PakOperations;

/// Extract every node of a PAK into `dest`
///
/// # Errors
/// Returns an error if the PAK cannot be read or the output cannot be written.
pub fn extract_pak<P: AsRef<std::path::Path>>(pak: P, dest: P) -> crate::error::Result<()> {
    PakOperations::extract(pak, dest)
}
