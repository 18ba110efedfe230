use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub download_timeout_secs: u64,
    pub split_seed: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            data_root: env::var("DATA_ROOT")
                .unwrap_or_else(|_| "datasets".to_string())
                .into(),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            split_seed: env::var("SPLIT_SEED")
                .unwrap_or_else(|_| "2020".to_string())
                .parse()
                .unwrap_or(2020),
        })
    }

    /// Root directory of a single dataset (holds `raw/` and `processed/`)
    pub fn dataset_dir(&self, dataset_name: &str) -> PathBuf {
        self.data_root.join(dataset_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("datasets"),
            download_timeout_secs: 60,
            split_seed: 2020,
        }
    }
}
