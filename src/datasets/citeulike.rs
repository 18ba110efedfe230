use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::datasets::base::{DatasetBase, DatasetDescriptor, DatasetError, DatasetStore};
use crate::importers::UsersDatParser;
use crate::split::{LeaveOneOutOptions, LeaveOneOutSplit};

pub const CULA_NAME: &str = "citeulike-a";
pub const CULT_NAME: &str = "citeulike-t";

// Download URLs
pub const CULA_URL: &str = "https://github.com/js05212/citeulike-a";
pub const CULT_URL: &str = "https://github.com/js05212/citeulike-t";
pub const CULT_USERS_DAT_URL: &str = "https://github.com/js05212/citeulike-t/raw/master/users.dat";

// Processed data URLs
pub const CULA_LEAVE_ONE_OUT_URL: &str = "https://1drv.ms/u/s!AjMahLyQeZquggYnM5pZ_sGORKvf?e=oHgSbo";
pub const CULA_RANDOM_SPLIT_URL: &str = "https://1drv.ms/u/s!AjMahLyQeZqugghhNR4XWzUiS501?e=zmVqcx";
pub const CULT_LEAVE_ONE_OUT_URL: &str = "https://1drv.ms/u/s!AjMahLyQeZquggwTOwFEVQojKdyR?e=tTv3DX";
pub const CULT_RANDOM_SPLIT_URL: &str = "https://1drv.ms/u/s!AjMahLyQeZqugg4Ncblkn_gPRxtu?e=YQwM2D";

pub const CULT_NO_TIMESTAMP: &str =
    "CiteULikeT doesn't have timestamp column, please use random=True as parameter";

pub fn citeulike_a_descriptor() -> DatasetDescriptor {
    DatasetDescriptor {
        manual_download_url: Some(CULA_URL.to_string()),
        processed_leave_one_out_url: Some(CULA_LEAVE_ONE_OUT_URL.to_string()),
        processed_random_split_url: Some(CULA_RANDOM_SPLIT_URL.to_string()),
        ..DatasetDescriptor::new(CULA_NAME)
    }
}

pub fn citeulike_t_descriptor() -> DatasetDescriptor {
    DatasetDescriptor {
        url: Some(CULT_USERS_DAT_URL.to_string()),
        manual_download_url: Some(CULT_URL.to_string()),
        processed_leave_one_out_url: Some(CULT_LEAVE_ONE_OUT_URL.to_string()),
        processed_random_split_url: Some(CULT_RANDOM_SPLIT_URL.to_string()),
        ..DatasetDescriptor::new(CULT_NAME)
    }
}

/// Summary of one preprocess run, printed by `preprocess --json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreprocessReport {
    pub dataset: String,
    pub output: PathBuf,
    pub interactions: usize,
    pub users: usize,
    pub items: usize,
}

/// Read `users.dat` (downloading it first if missing), expand it into
/// interaction rows and save the table to `<name>_interaction.npz`.
async fn preprocess_users_dat<B: DatasetBase>(base: &B) -> Result<PreprocessReport, DatasetError> {
    let file_name = base.users_dat_path();
    if !file_name.exists() {
        info!("{} not found, downloading", file_name.display());
        base.download().await?;
    }

    let transactions = UsersDatParser::new(&file_name).parse()?;
    // There is no timestamp data in this dataset.
    let table = transactions.normalize()?;

    let output = base.interaction_npz_path();
    base.save_dataframe_as_npz(&table, &output)?;
    info!("Done. {} interactions written for {}", table.len(), base.dataset_name());

    Ok(PreprocessReport {
        dataset: base.dataset_name().to_string(),
        output,
        interactions: table.len(),
        users: table.user_ids().iter().collect::<HashSet<_>>().len(),
        items: table.item_ids().iter().collect::<HashSet<_>>().len(),
    })
}

async fn ensure_preprocessed<B: DatasetBase>(base: &B) -> Result<(), DatasetError> {
    if !base.interaction_npz_path().exists() {
        preprocess_users_dat(base).await?;
    }
    Ok(())
}

/// CiteULike-A
///
/// The dataset can not be downloaded by URL. Fetch it from
/// <https://github.com/js05212/citeulike-a> and place `users.dat` in
/// `citeulike-a/raw/citeulike-a/`.
pub struct CiteULikeA<B = DatasetStore> {
    base: B,
}

impl CiteULikeA<DatasetStore> {
    pub fn new(config: &Config) -> Result<Self, DatasetError> {
        Ok(Self::with_base(DatasetStore::new(
            citeulike_a_descriptor(),
            config,
        )?))
    }
}

impl<B: DatasetBase> CiteULikeA<B> {
    pub fn with_base(base: B) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    #[instrument(skip(self), fields(dataset = self.base.dataset_name()))]
    pub async fn preprocess(&self) -> Result<PreprocessReport, DatasetError> {
        preprocess_users_dat(&self.base).await
    }

    pub async fn load_leave_one_out(
        &self,
        options: &LeaveOneOutOptions,
    ) -> Result<LeaveOneOutSplit, DatasetError> {
        if !options.random {
            return Err(DatasetError::MissingTimestamp(
                self.base.dataset_name().to_string(),
            ));
        }
        ensure_preprocessed(&self.base).await?;
        self.base.load_leave_one_out(options)
    }
}

/// CiteULike-T
///
/// Carries no timestamps, so only random leave-one-out splits are possible.
pub struct CiteULikeT<B = DatasetStore> {
    base: B,
}

impl CiteULikeT<DatasetStore> {
    pub fn new(config: &Config) -> Result<Self, DatasetError> {
        Ok(Self::with_base(DatasetStore::new(
            citeulike_t_descriptor(),
            config,
        )?))
    }
}

impl<B: DatasetBase> CiteULikeT<B> {
    pub fn with_base(base: B) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    #[instrument(skip(self), fields(dataset = self.base.dataset_name()))]
    pub async fn preprocess(&self) -> Result<PreprocessReport, DatasetError> {
        preprocess_users_dat(&self.base).await
    }

    pub async fn load_leave_one_out(
        &self,
        options: &LeaveOneOutOptions,
    ) -> Result<LeaveOneOutSplit, DatasetError> {
        if !options.random {
            warn!("Rejecting time-ordered leave-one-out for {}", CULT_NAME);
            return Err(DatasetError::InvalidConfiguration(
                CULT_NO_TIMESTAMP.to_string(),
            ));
        }
        ensure_preprocessed(&self.base).await?;
        self.base.load_leave_one_out(options)
    }
}
