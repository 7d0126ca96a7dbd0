//! `--scan`: recursively lists `.tex` files under the current directory
//! with human-readable sizes, mirroring this project's predecessor's own
//! directory scan.

use std::path::{Path, PathBuf};

use colored::Colorize;

pub fn scan_current_dir() -> std::io::Result<()> {
    println!("{}", "Scanning for .tex files in current directory...".cyan());
    println!();

    let mut tex_files = Vec::new();
    collect_tex_files(Path::new("."), &mut tex_files)?;

    if tex_files.is_empty() {
        println!("No .tex files found in current directory.");
        return Ok(());
    }

    println!("Found {} .tex file(s):", tex_files.len());

    let mut sizes: Vec<(PathBuf, Option<u64>)> = Vec::with_capacity(tex_files.len());
    let mut max_path_len = 0usize;
    let mut max_size_len = 0usize;
    for path in tex_files {
        let size = std::fs::metadata(&path).ok().map(|m| m.len());
        max_path_len = max_path_len.max(path.display().to_string().len());
        if let Some(bytes) = size {
            max_size_len = max_size_len.max(format_bytes(bytes).len());
        }
        sizes.push((path, size));
    }

    for (i, (path, size)) in sizes.iter().enumerate() {
        let path_str = path.display().to_string();
        match size {
            Some(bytes) => println!(
                "  {:2}. {:<pw$} {:>sw$}",
                i + 1,
                path_str,
                format_bytes(*bytes),
                pw = max_path_len,
                sw = max_size_len
            ),
            None => println!("  {:2}. {:<pw$} (error reading file info)", i + 1, path_str, pw = max_path_len),
        }
    }

    Ok(())
}

fn collect_tex_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.starts_with('.') {
            continue;
        }

        if entry.file_type()?.is_dir() {
            collect_tex_files(&path, out)?;
        } else if name.to_lowercase().ends_with(".tex") {
            out.push(path);
        }
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const SUFFIXES: &[u8] = b"KMGTPE";

    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, SUFFIXES[exp] as char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_under_a_kilobyte_use_plain_suffix() {
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn kilobytes_get_one_decimal_place() {
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
