use ndarray::Array1;
use ndarray_npy::{NpzReader, NpzWriter};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::constants::{DEFAULT_ITEM_COL, DEFAULT_RATING_COL, DEFAULT_USER_COL, USERS_DAT};
use crate::importers::{DownloadError, RawFileDownloader, UsersDatError};
use crate::interactions::{InteractionTable, TableError};
use crate::split::{random_leave_one_out, LeaveOneOutOptions, LeaveOneOutSplit};

/// Directory under `processed_path` holding random leave-one-out splits
pub const LEAVE_ONE_OUT_RANDOM_DIR: &str = "leave_one_out_random";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error(
        "{name} can not be downloaded automatically; download it from {url} \
         and put users.dat into {dir}"
    )]
    ManualDownloadRequired {
        name: String,
        url: String,
        dir: String,
    },

    #[error("No download source configured for {0}")]
    NoDownloadSource(String),

    #[error("Failed to parse raw file: {0}")]
    Parse(#[from] UsersDatError),

    #[error("Invalid interaction table: {0}")]
    Table(#[from] TableError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("npz error on {path}: {msg}")]
    Npz { path: String, msg: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{0} has no timestamp column; use a random split instead")]
    MissingTimestamp(String),
}

impl DatasetError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn npz(path: &Path, err: impl std::fmt::Display) -> Self {
        DatasetError::Npz {
            path: path.display().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Where a dataset comes from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetDescriptor {
    pub name: String,
    /// Direct download URL of `users.dat`
    pub url: Option<String>,
    /// Page to send users to when there is no direct URL
    pub manual_download_url: Option<String>,
    pub processed_leave_one_out_url: Option<String>,
    pub processed_random_split_url: Option<String>,
}

impl DatasetDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            manual_download_url: None,
            processed_leave_one_out_url: None,
            processed_random_split_url: None,
        }
    }
}

/// Shared dataset machinery that every dataset adapter builds on
#[allow(async_fn_in_trait)]
pub trait DatasetBase {
    fn dataset_name(&self) -> &str;

    /// Directory holding downloaded raw files
    fn raw_path(&self) -> &Path;

    /// Directory holding `.npz` outputs
    fn processed_path(&self) -> &Path;

    /// Fetch the raw files into `raw_path`
    async fn download(&self) -> Result<(), DatasetError>;

    fn save_dataframe_as_npz(
        &self,
        table: &InteractionTable,
        path: &Path,
    ) -> Result<(), DatasetError>;

    fn load_interaction_npz(&self, path: &Path) -> Result<InteractionTable, DatasetError>;

    fn load_leave_one_out(
        &self,
        options: &LeaveOneOutOptions,
    ) -> Result<LeaveOneOutSplit, DatasetError>;

    /// `<processed_path>/<dataset_name>_interaction.npz`
    fn interaction_npz_path(&self) -> PathBuf {
        self.processed_path()
            .join(format!("{}_interaction.npz", self.dataset_name()))
    }

    /// `<raw_path>/<dataset_name>/users.dat`
    fn users_dat_path(&self) -> PathBuf {
        self.raw_path().join(self.dataset_name()).join(USERS_DAT)
    }
}

/// Filesystem-backed dataset base: `<data_root>/<name>/{raw,processed}`
pub struct DatasetStore {
    descriptor: DatasetDescriptor,
    raw_path: PathBuf,
    processed_path: PathBuf,
    downloader: RawFileDownloader,
}

impl DatasetStore {
    pub fn new(descriptor: DatasetDescriptor, config: &Config) -> Result<Self, DatasetError> {
        let dataset_dir = config.dataset_dir(&descriptor.name);
        let downloader =
            RawFileDownloader::new(Duration::from_secs(config.download_timeout_secs))?;
        Ok(Self {
            raw_path: dataset_dir.join("raw"),
            processed_path: dataset_dir.join("processed"),
            descriptor,
            downloader,
        })
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn split_path(&self, file_name: &str) -> PathBuf {
        self.processed_path
            .join(LEAVE_ONE_OUT_RANDOM_DIR)
            .join(file_name)
    }
}

impl DatasetBase for DatasetStore {
    fn dataset_name(&self) -> &str {
        &self.descriptor.name
    }

    fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    fn processed_path(&self) -> &Path {
        &self.processed_path
    }

    #[instrument(skip(self), fields(dataset = %self.descriptor.name))]
    async fn download(&self) -> Result<(), DatasetError> {
        let dest = self.users_dat_path();
        match (&self.descriptor.url, &self.descriptor.manual_download_url) {
            (Some(url), _) => {
                self.downloader.download_to(url, &dest).await?;
                Ok(())
            }
            (None, Some(manual)) => Err(DatasetError::ManualDownloadRequired {
                name: self.descriptor.name.clone(),
                url: manual.clone(),
                dir: dest
                    .parent()
                    .unwrap_or(&self.raw_path)
                    .display()
                    .to_string(),
            }),
            (None, None) => Err(DatasetError::NoDownloadSource(
                self.descriptor.name.clone(),
            )),
        }
    }

    fn save_dataframe_as_npz(
        &self,
        table: &InteractionTable,
        path: &Path,
    ) -> Result<(), DatasetError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| DatasetError::io(dir, e))?;

        let tmp = NamedTempFile::new_in(dir).map_err(|e| DatasetError::io(dir, e))?;
        let mut npz = NpzWriter::new_compressed(tmp);
        let [user_col, item_col, rating_col] = table.columns();

        npz.add_array(user_col, &Array1::from(table.user_ids().to_vec()))
            .map_err(|e| DatasetError::npz(path, e))?;
        npz.add_array(item_col, &Array1::from(table.item_ids().to_vec()))
            .map_err(|e| DatasetError::npz(path, e))?;
        npz.add_array(rating_col, &Array1::from(table.ratings().to_vec()))
            .map_err(|e| DatasetError::npz(path, e))?;

        let tmp = npz.finish().map_err(|e| DatasetError::npz(path, e))?;
        tmp.persist(path)
            .map_err(|e| DatasetError::io(path, e.error))?;

        info!("Saved {} interactions to {}", table.len(), path.display());
        Ok(())
    }

    fn load_interaction_npz(&self, path: &Path) -> Result<InteractionTable, DatasetError> {
        debug!("Loading {}", path.display());
        let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
        let mut npz = NpzReader::new(file).map_err(|e| DatasetError::npz(path, e))?;

        let users: Array1<i64> = npz
            .by_name(&format!("{DEFAULT_USER_COL}.npy"))
            .map_err(|e| DatasetError::npz(path, e))?;
        let items: Array1<i64> = npz
            .by_name(&format!("{DEFAULT_ITEM_COL}.npy"))
            .map_err(|e| DatasetError::npz(path, e))?;
        let ratings: Array1<f64> = npz
            .by_name(&format!("{DEFAULT_RATING_COL}.npy"))
            .map_err(|e| DatasetError::npz(path, e))?;

        Ok(InteractionTable::from_columns(
            users.to_vec(),
            items.to_vec(),
            ratings.to_vec(),
        )?)
    }

    fn load_leave_one_out(
        &self,
        options: &LeaveOneOutOptions,
    ) -> Result<LeaveOneOutSplit, DatasetError> {
        if !options.random {
            return Err(DatasetError::MissingTimestamp(
                self.descriptor.name.clone(),
            ));
        }

        let table = self.load_interaction_npz(&self.interaction_npz_path())?;
        let split = random_leave_one_out(&table, options);

        self.save_dataframe_as_npz(&split.train, &self.split_path("train.npz"))?;
        for (i, valid) in split.validate.iter().enumerate() {
            self.save_dataframe_as_npz(valid, &self.split_path(&format!("valid_{i}.npz")))?;
        }
        for (i, test) in split.test.iter().enumerate() {
            self.save_dataframe_as_npz(test, &self.split_path(&format!("test_{i}.npz")))?;
        }

        info!(
            "Leave-one-out split for {} saved under {}",
            self.descriptor.name,
            self.processed_path.join(LEAVE_ONE_OUT_RANDOM_DIR).display()
        );
        Ok(split)
    }
}
