//! Shared helpers for CLI tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Write `frame_000.pcd`, `frame_001.pcd`, ... where frame `i` holds `i + 1` points.
pub fn write_frames(dir: &Path, count: usize) {
    for i in 0..count {
        let points = i + 1;
        let mut content = format!(
            "VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\nWIDTH {}\nHEIGHT 1\nPOINTS {}\nDATA ascii\n",
            points, points
        );
        for p in 0..points {
            content.push_str(&format!("{} {} 0\n", p, i));
        }
        fs::write(dir.join(format!("frame_{:03}.pcd", i)), content).expect("Failed to write frame");
    }
}
