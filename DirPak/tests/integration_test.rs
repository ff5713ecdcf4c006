use dirpak::prelude::*;
use dirpak::pak::format::{ALIGNMENT, HEADER_SIZE, PADDING_BYTE};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic xorshift noise that zlib cannot shrink
fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Relative path -> contents (None for directories) of a tree on disk
fn snapshot(base: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    walkdir::WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(base).unwrap().to_path_buf();
            let data = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, data)
        })
        .collect()
}

fn write_sample(base: &Path) {
    fs::create_dir_all(base.join("root/sub/deeper")).unwrap();
    fs::create_dir_all(base.join("root/empty")).unwrap();
    fs::write(base.join("root/a.txt"), "alpha").unwrap();
    fs::write(base.join("root/sub/b.txt"), "b".repeat(4096)).unwrap();
    fs::write(base.join("root/sub/deeper/noise.bin"), noise(3000, 7)).unwrap();
    fs::write(base.join("root/zero.bin"), b"").unwrap();
    fs::write(base.join("top.txt"), "top level file").unwrap();
}

fn roundtrip(options: &BuildOptions) {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_sample(&src);

    let pak = temp.path().join("sample.pak");
    PakOperations::create_with_options(&src, &pak, options).unwrap();

    let out = temp.path().join("out");
    PakOperations::extract(&pak, &out).unwrap();

    assert_eq!(snapshot(&src), snapshot(&out));
}

#[test]
fn test_roundtrip_compressed() {
    roundtrip(&BuildOptions::default());
}

#[test]
fn test_roundtrip_uncompressed() {
    roundtrip(&BuildOptions::new().with_compression(false));
}

#[test]
fn test_roundtrip_big_endian() {
    roundtrip(&BuildOptions::new().with_endianness(Endianness::Big));
}

#[test]
fn test_section_alignment() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_sample(&src);
    let pak = temp.path().join("sample.pak");
    PakOperations::create(&src, &pak).unwrap();

    let bytes = fs::read(&pak).unwrap();
    let archive = PakArchive::from_reader(Cursor::new(bytes.clone())).unwrap();
    let header = *archive.header();

    assert_eq!(header.entry_start % ALIGNMENT, 0);
    assert_eq!(header.string_table_offset % ALIGNMENT, 0);
    assert_eq!(header.data_offset % ALIGNMENT, 0);
    assert!(bytes[HEADER_SIZE..header.entry_start as usize].iter().all(|&b| b == PADDING_BYTE));

    // Gap after the string blob is padding too
    let strings_end = (header.string_table_offset + header.string_table_size) as usize;
    assert!(bytes[strings_end..header.data_offset as usize]
        .iter()
        .all(|&b| b == PADDING_BYTE));

    for entry in archive.entries() {
        if let dirpak::pak::format::EntryKind::File { payload_offset, .. } = entry.kind {
            assert_eq!(payload_offset % ALIGNMENT, 0);
        }
    }
    assert_eq!(bytes.len() as u64 % ALIGNMENT, 0);
}

#[test]
fn test_compression_policy() {
    let random = noise(5000, 42);
    let repetitive = b"the same line again\n".repeat(300);
    let source = MemorySource::new()
        .with_file("random.bin", random.clone())
        .with_file("repetitive.txt", repetitive.clone());

    let mut out = Vec::new();
    PakBuilder::new(BuildOptions::default())
        .unwrap()
        .build(&source, &mut out)
        .unwrap();
    let mut archive = PakArchive::from_reader(Cursor::new(out)).unwrap();

    let random_entry = *archive.entry(0).unwrap();
    assert!(!random_entry.is_compressed());
    assert_eq!(random_entry.payload_size(), 5000);

    let repetitive_entry = *archive.entry(1).unwrap();
    assert!(repetitive_entry.is_compressed());
    assert_eq!(repetitive_entry.file_size(), repetitive.len() as u64);
    assert!(repetitive_entry.payload_size() < repetitive.len() as u64);

    assert_eq!(archive.read_file("/random.bin").unwrap(), random);
    assert_eq!(archive.read_file("/repetitive.txt").unwrap(), repetitive);
}

#[test]
fn test_empty_source_directory() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("empty");
    fs::create_dir(&src).unwrap();
    let pak = temp.path().join("empty.pak");

    let summary = PakOperations::create(&src, &pak).unwrap();
    assert_eq!(summary.entry_count, 0);

    let info = PakOperations::info(&pak).unwrap();
    assert_eq!(info.header.entry_count, 0);
    assert_eq!(info.header.entry_start, 64);
    assert_eq!(info.header.string_table_offset, 64);
    assert_eq!(info.header.data_offset, 64);
    assert!(PakOperations::list(&pak).unwrap().is_empty());
}

#[test]
fn test_consumption_closure() {
    let mut source = MemorySource::new()
        .with_dir("a/empty1")
        .with_dir("a/empty2")
        .with_file("a/f", b"f".to_vec())
        .with_dir("b");
    let chain: String = (0..200).map(|i| format!("c{i}/")).collect();
    source = source.with_file(format!("{chain}leaf.txt"), b"deep".to_vec());

    let mut out = Vec::new();
    let summary = PakBuilder::new(BuildOptions::default())
        .unwrap()
        .build(&source, &mut out)
        .unwrap();
    let mut archive = PakArchive::from_reader(Cursor::new(out)).unwrap();

    assert_eq!(archive.entry_count() as u64, summary.entry_count);
    assert_eq!(archive.tree().len(), archive.entry_count() + 1);
    assert_eq!(
        archive.read_file(&format!("/{chain}leaf.txt")).unwrap(),
        b"deep"
    );

    let top: Vec<_> = archive
        .tree()
        .children(archive.tree().root())
        .map(|id| archive.tree().node(id).name.clone())
        .collect();
    assert_eq!(top, ["a", "b", "c0"]);
}

#[test]
fn test_path_resolution() {
    let source = MemorySource::new()
        .with_file("root/a.txt", b"a".to_vec())
        .with_file("root/sub/b.txt", b"b".to_vec());
    let mut out = Vec::new();
    PakBuilder::new(BuildOptions::default())
        .unwrap()
        .build(&source, &mut out)
        .unwrap();
    let archive = PakArchive::from_reader(Cursor::new(out)).unwrap();
    let tree = archive.tree();

    let file = tree.find_file("/root/sub/b.txt").unwrap();
    assert_eq!(tree.node(file).name, "b.txt");
    assert_eq!(tree.find_file("/root/sub"), None);
    assert!(tree.find_dir("/root/sub").is_some());
    assert_eq!(tree.resolve("/root/sub", Lookup::Any), tree.find_dir("/root/sub"));
}

#[test]
fn test_seek_bounds() {
    let source = MemorySource::new().with_file("ten", b"0123456789".to_vec());
    let mut out = Vec::new();
    PakBuilder::new(BuildOptions::default())
        .unwrap()
        .build(&source, &mut out)
        .unwrap();
    let mut archive = PakArchive::from_reader(Cursor::new(out)).unwrap();
    let mut file = archive.open_file("/ten").unwrap().unwrap();

    assert_eq!(file.len(), 10);
    assert_eq!(file.seek(SeekMode::FromEnd(0)).unwrap(), 10);
    assert_eq!(file.seek(SeekMode::FromEnd(3)).unwrap(), 7);
    file.seek(SeekMode::Start(0)).unwrap();
    assert!(matches!(
        file.seek(SeekMode::Current(-1)),
        Err(Error::SeekOutOfRange { .. })
    ));
    assert_eq!(file.position(), 0);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_skipped() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("dir")).unwrap();
    fs::write(src.join("dir/real.txt"), "real").unwrap();
    std::os::unix::fs::symlink(src.join("dir/real.txt"), src.join("dir/link.txt")).unwrap();
    std::os::unix::fs::symlink(src.join("dir"), src.join("dirlink")).unwrap();

    let pak = temp.path().join("links.pak");
    let summary = PakOperations::create(&src, &pak).unwrap();
    assert_eq!(summary.skipped_count, 2);
    assert_eq!(summary.entry_count, 2);

    let paths = PakOperations::list(&pak).unwrap();
    assert_eq!(paths, ["/dir", "/dir/real.txt"]);

    let info = PakOperations::info(&pak).unwrap();
    assert_eq!(info.directory_count, 1);
    assert_eq!(info.file_count, 1);
}

#[test]
fn test_git_directory_is_ignored() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("project/.git")).unwrap();
    fs::write(src.join("project/.git/HEAD"), "ref").unwrap();
    fs::write(src.join("project/main.c"), "int main;").unwrap();

    let pak = temp.path().join("p.pak");
    PakOperations::create(&src, &pak).unwrap();
    assert_eq!(
        PakOperations::list(&pak).unwrap(),
        ["/project", "/project/main.c"]
    );
}

#[test]
fn test_invalid_archives() {
    let temp = TempDir::new().unwrap();

    let bad_magic = temp.path().join("bad.pak");
    fs::write(&bad_magic, vec![0u8; 128]).unwrap();
    let err = PakOperations::list(&bad_magic).unwrap_err();
    assert!(matches!(err, Error::InvalidMagic(_)));
    assert!(err.is_format_error());

    let src = temp.path().join("src");
    write_sample(&src);
    let good = temp.path().join("good.pak");
    PakOperations::create(&src, &good).unwrap();
    let bytes = fs::read(&good).unwrap();

    let short = temp.path().join("short.pak");
    fs::write(&short, &bytes[..30]).unwrap();
    assert!(matches!(
        PakOperations::info(&short),
        Err(Error::Truncated { section: "header", .. })
    ));

    let cut = temp.path().join("cut.pak");
    fs::write(&cut, &bytes[..100]).unwrap();
    assert!(matches!(
        PakOperations::list(&cut),
        Err(Error::Truncated { section: "entry table", .. })
    ));
}

#[test]
fn test_list_detailed() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_sample(&src);
    let pak = temp.path().join("sample.pak");
    PakOperations::create(&src, &pak).unwrap();

    let entries = PakOperations::list_detailed(&pak).unwrap();
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.file_id, i as u64);
    }

    let b = entries.iter().find(|e| e.path == "/root/sub/b.txt").unwrap();
    assert!(b.compressed);
    assert_eq!(b.size, 4096);
    assert!(b.stored_size < 4096);

    let empty = entries.iter().find(|e| e.path == "/root/empty").unwrap();
    assert!(empty.is_dir);
    assert_eq!(empty.size, 0);
}

#[test]
fn test_deterministic_output() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    write_sample(&src);

    let first = temp.path().join("1.pak");
    let second = temp.path().join("2.pak");
    PakOperations::create(&src, &first).unwrap();
    PakOperations::create(&src, &second).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}
