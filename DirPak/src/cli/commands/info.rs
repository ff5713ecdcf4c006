//! CLI command printing the entry tree and header of a PAK file

use std::path::Path;

use super::list::format_size;
use crate::pak::{PakArchive, PakTree};

pub fn execute(source: &Path) -> anyhow::Result<()> {
    let archive = PakArchive::open(source)?;
    let tree = archive.tree();

    println!("PAK Information: {}", source.display());
    println!();

    print_tree(&archive, tree);
    println!();

    let info = archive.info();
    let header = info.header;
    println!("Endianness:          {}", header.endianness.as_str());
    println!("Entry count:         {}", header.entry_count);
    println!("Entry table offset:  {:#x}", header.entry_start);
    println!("String table offset: {:#x}", header.string_table_offset);
    println!("String table size:   {}", header.string_table_size);
    println!("Data offset:         {:#x}", header.data_offset);
    println!();
    println!(
        "{} files, {} directories, {} compressed",
        info.file_count, info.directory_count, info.compressed_count
    );
    println!(
        "Total size: {} ({} stored)",
        format_size(info.total_size),
        format_size(info.stored_size)
    );

    Ok(())
}

/// One line per node: indentation by depth, file id and parent id
fn print_tree<R: std::io::Read + std::io::Seek>(archive: &PakArchive<R>, tree: &PakTree) {
    for id in tree.walk() {
        let node = tree.node(id);
        let Some(entry) = archive.node_entry(id) else {
            continue;
        };
        let parent = tree
            .parent(id)
            .and_then(|p| archive.node_entry(p))
            .map_or_else(|| "-".to_string(), |p| p.file_id.to_string());
        let indent = "  ".repeat(tree.depth(id).saturating_sub(1));
        let suffix = if node.is_dir { "/" } else { "" };

        println!(
            "{indent}{}{suffix}  [id {}, parent {parent}]",
            node.name, entry.file_id
        );
    }
}
