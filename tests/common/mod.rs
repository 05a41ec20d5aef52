#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes a small, real PNG (decodable by the `image` crate).
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    image::RgbImage::new(width, height)
        .save(path)
        .expect("write png file");
}

/// Sorted entry names of a zip archive.
pub fn zip_entry_names(archive: &Path) -> Vec<String> {
    let file = File::open(archive).expect("open archive");
    let zip = zip::ZipArchive::new(file).expect("read archive");
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Entry names without directory entries.
pub fn zip_file_names(archive: &Path) -> Vec<String> {
    zip_entry_names(archive)
        .into_iter()
        .filter(|name| !name.ends_with('/'))
        .collect()
}

pub fn read_zip_entry(archive: &Path, name: &str) -> Vec<u8> {
    let file = File::open(archive).expect("open archive");
    let mut zip = zip::ZipArchive::new(file).expect("read archive");
    let mut entry = zip.by_name(name).expect("entry exists");
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).expect("read entry");
    bytes
}

pub fn read_zip_text(archive: &Path, name: &str) -> String {
    String::from_utf8(read_zip_entry(archive, name)).expect("utf-8 entry")
}
