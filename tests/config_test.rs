// Config::from_env reads process-wide environment variables, so these run serially

use citeulike_prep::config::Config;
use serial_test::serial;
use std::path::PathBuf;

fn clear_env() {
    std::env::remove_var("DATA_ROOT");
    std::env::remove_var("DOWNLOAD_TIMEOUT_SECS");
    std::env::remove_var("SPLIT_SEED");
}

#[test]
#[serial]
fn test_config_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config.data_root, PathBuf::from("datasets"));
    assert_eq!(config.download_timeout_secs, 60);
    assert_eq!(config.split_seed, 2020);
}

#[test]
#[serial]
fn test_config_from_env_overrides() {
    clear_env();
    std::env::set_var("DATA_ROOT", "/data/recsys");
    std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "5");
    std::env::set_var("SPLIT_SEED", "7");

    let config = Config::from_env().unwrap();
    assert_eq!(config.data_root, PathBuf::from("/data/recsys"));
    assert_eq!(config.download_timeout_secs, 5);
    assert_eq!(config.split_seed, 7);
    assert_eq!(
        config.dataset_dir("citeulike-a"),
        PathBuf::from("/data/recsys/citeulike-a")
    );

    clear_env();
}

#[test]
#[serial]
fn test_config_invalid_numbers_fall_back() {
    clear_env();
    std::env::set_var("DOWNLOAD_TIMEOUT_SECS", "soon");

    let config = Config::from_env().unwrap();
    assert_eq!(config.download_timeout_secs, 60);

    clear_env();
}
