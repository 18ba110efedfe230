use std::fs;
use std::path::Path;

use citeulike_prep::config::Config;
use tempfile::TempDir;

/// Fresh data root under a temporary directory
pub fn test_config() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = Config {
        data_root: dir.path().to_path_buf(),
        ..Config::default()
    };
    (dir, config)
}

/// Write `lines` as `<raw_path>/<name>/users.dat`
pub fn write_users_dat(raw_path: &Path, dataset_name: &str, lines: &[&str]) {
    let dir = raw_path.join(dataset_name);
    fs::create_dir_all(&dir).expect("Failed to create raw dir");
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(dir.join("users.dat"), contents).expect("Failed to write users.dat");
}
