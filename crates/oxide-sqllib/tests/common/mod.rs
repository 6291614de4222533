#![allow(dead_code)]

use std::fs::{File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// Writes `contents` to `name` inside `dir` and returns the file path.
pub fn write_library(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).expect("Failed to create library file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write library file");
    path
}

/// Sets the file's modification time to `secs` seconds after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("Failed to open library file");
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
    file.set_times(FileTimes::new().set_modified(time))
        .expect("Failed to set modification time");
}

/// Lines of `text` with terminators kept, as a file reader returns them.
pub fn lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}
