//! Column names shared by every processed dataset

pub const DEFAULT_USER_COL: &str = "col_user";
pub const DEFAULT_ITEM_COL: &str = "col_item";
pub const DEFAULT_RATING_COL: &str = "col_rating";

/// Name of the raw adjacency-list file inside `<raw_path>/<dataset_name>/`
pub const USERS_DAT: &str = "users.dat";
