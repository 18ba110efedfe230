use thiserror::Error;
use tracing::debug;

use crate::constants::{DEFAULT_ITEM_COL, DEFAULT_RATING_COL, DEFAULT_USER_COL};

/// Column names used while a table is staged from a raw file
pub const RAW_USER_COL: &str = "userID";
pub const RAW_ITEM_COL: &str = "itemID";
pub const RAW_RATING_COL: &str = "rating";

/// Every preprocessed interaction is implicit feedback
pub const IMPLICIT_RATING: f64 = 1.0;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Invalid integer in column {column} at row {row}: {value:?}")]
    InvalidInteger {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column length mismatch: {users} users, {items} items, {ratings} ratings")]
    LengthMismatch {
        users: usize,
        items: usize,
        ratings: usize,
    },
}

/// A single (user, item, rating) row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub user_id: i64,
    pub item_id: i64,
    pub rating: f64,
}

/// User/item tokens exactly as they were read, before any casting
#[derive(Debug, Clone, Default)]
pub struct RawTransactions {
    pub users: Vec<String>,
    pub items: Vec<String>,
}

impl RawTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, user: &str, item: &str) {
        self.users.push(user.to_string());
        self.items.push(item.to_string());
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Cast ids to integers, insert the constant rating column at position 2,
    /// and rename to the standard column names.
    pub fn normalize(self) -> Result<InteractionTable, TableError> {
        let user_ids = cast_ids(&self.users, RAW_USER_COL)?;
        let item_ids = cast_ids(&self.items, RAW_ITEM_COL)?;
        let ratings = vec![IMPLICIT_RATING; user_ids.len()];

        let mut table = InteractionTable::staged(user_ids, item_ids, ratings);
        table.rename_columns(&[
            (RAW_USER_COL, DEFAULT_USER_COL),
            (RAW_ITEM_COL, DEFAULT_ITEM_COL),
            (RAW_RATING_COL, DEFAULT_RATING_COL),
        ]);
        debug!("Normalized {} interactions", table.len());
        Ok(table)
    }
}

fn cast_ids(tokens: &[String], column: &str) -> Result<Vec<i64>, TableError> {
    tokens
        .iter()
        .enumerate()
        .map(|(row, token)| {
            token.parse::<i64>().map_err(|_| TableError::InvalidInteger {
                column: column.to_string(),
                row,
                value: token.clone(),
            })
        })
        .collect()
}

/// Column-oriented user-item interaction table
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionTable {
    columns: [String; 3],
    user_ids: Vec<i64>,
    item_ids: Vec<i64>,
    ratings: Vec<f64>,
}

impl InteractionTable {
    /// Build a table under the standard column names
    pub fn from_columns(
        user_ids: Vec<i64>,
        item_ids: Vec<i64>,
        ratings: Vec<f64>,
    ) -> Result<Self, TableError> {
        if user_ids.len() != item_ids.len() || user_ids.len() != ratings.len() {
            return Err(TableError::LengthMismatch {
                users: user_ids.len(),
                items: item_ids.len(),
                ratings: ratings.len(),
            });
        }
        Ok(Self {
            columns: standard_columns(),
            user_ids,
            item_ids,
            ratings,
        })
    }

    pub fn from_rows(rows: &[Interaction]) -> Self {
        Self {
            columns: standard_columns(),
            user_ids: rows.iter().map(|r| r.user_id).collect(),
            item_ids: rows.iter().map(|r| r.item_id).collect(),
            ratings: rows.iter().map(|r| r.rating).collect(),
        }
    }

    fn staged(user_ids: Vec<i64>, item_ids: Vec<i64>, ratings: Vec<f64>) -> Self {
        Self {
            columns: [
                RAW_USER_COL.to_string(),
                RAW_ITEM_COL.to_string(),
                RAW_RATING_COL.to_string(),
            ],
            user_ids,
            item_ids,
            ratings,
        }
    }

    fn rename_columns(&mut self, mapping: &[(&str, &str)]) {
        for column in self.columns.iter_mut() {
            if let Some((_, to)) = mapping.iter().find(|(from, _)| *from == column.as_str()) {
                *column = to.to_string();
            }
        }
    }

    /// Column names in order: user, item, rating
    pub fn columns(&self) -> [&str; 3] {
        [
            self.columns[0].as_str(),
            self.columns[1].as_str(),
            self.columns[2].as_str(),
        ]
    }

    pub fn user_ids(&self) -> &[i64] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[i64] {
        &self.item_ids
    }

    pub fn ratings(&self) -> &[f64] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Interaction> {
        Some(Interaction {
            user_id: *self.user_ids.get(index)?,
            item_id: *self.item_ids.get(index)?,
            rating: *self.ratings.get(index)?,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Interaction> + '_ {
        self.user_ids
            .iter()
            .zip(&self.item_ids)
            .zip(&self.ratings)
            .map(|((&user_id, &item_id), &rating)| Interaction {
                user_id,
                item_id,
                rating,
            })
    }
}

fn standard_columns() -> [String; 3] {
    [
        DEFAULT_USER_COL.to_string(),
        DEFAULT_ITEM_COL.to_string(),
        DEFAULT_RATING_COL.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawTransactions {
        let mut raw = RawTransactions::new();
        for (user, item) in pairs {
            raw.push(user, item);
        }
        raw
    }

    #[test]
    fn test_normalize_renames_columns() {
        let table = raw(&[("1", "10")]).normalize().unwrap();
        assert_eq!(table.columns(), ["col_user", "col_item", "col_rating"]);
    }

    #[test]
    fn test_normalize_inserts_implicit_rating() {
        let table = raw(&[("1", "10"), ("1", "20"), ("2", "10")])
            .normalize()
            .unwrap();
        assert_eq!(table.ratings(), &[1.0, 1.0, 1.0]);
        assert_eq!(table.user_ids(), &[1, 1, 2]);
        assert_eq!(table.item_ids(), &[10, 20, 10]);
    }

    #[test]
    fn test_normalize_rejects_non_integer_item() {
        let err = raw(&[("1", "10"), ("1", "x7")]).normalize().unwrap_err();
        match err {
            TableError::InvalidInteger { column, row, value } => {
                assert_eq!(column, "itemID");
                assert_eq!(row, 1);
                assert_eq!(value, "x7");
            }
            _ => panic!("Expected InvalidInteger error"),
        }
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let result = InteractionTable::from_columns(vec![1, 2], vec![3], vec![1.0, 1.0]);
        assert!(matches!(result, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn test_row_out_of_bounds() {
        let table = InteractionTable::from_rows(&[Interaction {
            user_id: 4,
            item_id: 5,
            rating: 0.0,
        }]);
        assert_eq!(table.row(0).map(|r| r.item_id), Some(5));
        assert!(table.row(1).is_none());
    }
}
