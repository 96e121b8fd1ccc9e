//! SFEN 入力の読み込み（gzip対応）

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

const READER_BUF_CAP: usize = 128 * 1024; // 128 KiB

/// ファイル（`-` なら標準入力、`.gz` なら展開）を開く
pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if p.to_string_lossy() == "-" {
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, io::stdin())));
    }
    let f = File::open(p)?;
    let ext = p.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();

    if ext == "gz" {
        let dec = flate2::read::GzDecoder::new(f);
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, dec)));
    }
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// 1行1局面の SFEN を読む
///
/// 空行と `#` で始まる行は飛ばす。行頭の `sfen ` と `position sfen ` は取り除く。
pub fn read_sfen_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", i + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let sfen = trimmed
            .strip_prefix("position sfen ")
            .or_else(|| trimmed.strip_prefix("sfen "))
            .unwrap_or(trimmed);
        lines.push(sfen.to_string());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_sfen_lines_skips_comments() {
        let text = "# comment\n\nsfen 4k4/9/9/9/9/9/9/9/4K4 b G 1\nposition sfen 4k4/9/9/9/9/9/9/9/4K4 w - 2\n";
        let lines = read_sfen_lines(text.as_bytes()).unwrap();
        assert_eq!(
            lines,
            vec!["4k4/9/9/9/9/9/9/9/4K4 b G 1".to_string(), "4k4/9/9/9/9/9/9/9/4K4 w - 2".to_string()]
        );
    }

    #[test]
    fn test_open_reader_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.sfen.gz");
        let file = File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        writeln!(enc, "4k4/9/9/9/9/9/9/9/4K4 b G 1").unwrap();
        enc.finish().unwrap();

        let lines = read_sfen_lines(open_reader(&path).unwrap()).unwrap();
        assert_eq!(lines.len(), 1);
    }
}
