//! Raw file importers: HTTP download and `users.dat` parsing

pub mod downloader;
pub mod users_dat;

// Re-export commonly used items
pub use downloader::{DownloadError, RawFileDownloader};
pub use users_dat::{UsersDatError, UsersDatParser};
