// Dataset adapters
//
// Each adapter owns a `DatasetBase` (paths, download, npz persistence) and
// adds the dataset-specific preprocessing on top of it.

pub mod base;
pub mod citeulike;

use std::fmt;
use std::str::FromStr;

pub use base::{DatasetBase, DatasetDescriptor, DatasetError, DatasetStore};
pub use citeulike::{CiteULikeA, CiteULikeT, PreprocessReport};

/// The dataset variants this crate knows how to prepare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    CiteULikeA,
    CiteULikeT,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::CiteULikeA, DatasetKind::CiteULikeT];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::CiteULikeA => citeulike::CULA_NAME,
            DatasetKind::CiteULikeT => citeulike::CULT_NAME,
        }
    }

    pub fn descriptor(&self) -> DatasetDescriptor {
        match self {
            DatasetKind::CiteULikeA => citeulike::citeulike_a_descriptor(),
            DatasetKind::CiteULikeT => citeulike::citeulike_t_descriptor(),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "citeulike-a" | "cula" => Ok(DatasetKind::CiteULikeA),
            "citeulike-t" | "cult" => Ok(DatasetKind::CiteULikeT),
            other => Err(format!(
                "Unknown dataset '{other}'. Valid datasets: citeulike-a, citeulike-t"
            )),
        }
    }
}
