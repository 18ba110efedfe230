//! Random leave-one-out splitting
//!
//! Users with at least [`MIN_INTERACTIONS_FOR_HOLDOUT`] distinct items give
//! one item to the test set and one to the validation set; every other row
//! is training data. Repeated rows of a held-out item are dropped so the
//! item never also lands in train. Validation and test tables are replicated `n_test`
//! times, each copy carrying its own sample of negative items.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use crate::interactions::{Interaction, InteractionTable};

pub const MIN_INTERACTIONS_FOR_HOLDOUT: usize = 3;

/// Rating given to sampled negative items
pub const NEGATIVE_RATING: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveOneOutOptions {
    /// Hold out a random interaction per user instead of the latest one
    pub random: bool,
    pub n_negative: usize,
    pub n_test: usize,
    pub seed: u64,
}

impl Default for LeaveOneOutOptions {
    fn default() -> Self {
        Self {
            random: false,
            n_negative: 100,
            n_test: 10,
            seed: 2020,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeaveOneOutSplit {
    pub train: InteractionTable,
    pub validate: Vec<InteractionTable>,
    pub test: Vec<InteractionTable>,
}

pub fn random_leave_one_out(
    table: &InteractionTable,
    options: &LeaveOneOutOptions,
) -> LeaveOneOutSplit {
    let mut rng = StdRng::seed_from_u64(options.seed);

    // Users in order of first appearance so a fixed seed gives a fixed split.
    // Each user maps to its distinct items, each with every row it occurs on.
    let mut user_order = Vec::new();
    let mut items_by_user: HashMap<i64, Vec<(i64, Vec<usize>)>> = HashMap::new();
    for (idx, row) in table.rows().enumerate() {
        let items = items_by_user.entry(row.user_id).or_insert_with(|| {
            user_order.push(row.user_id);
            Vec::new()
        });
        match items.iter_mut().find(|(item, _)| *item == row.item_id) {
            Some((_, rows)) => rows.push(idx),
            None => items.push((row.item_id, vec![idx])),
        }
    }

    let all_items: Vec<i64> = table
        .item_ids()
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut train_rows = Vec::with_capacity(table.len());
    let mut validate_pos = Vec::new();
    let mut test_pos = Vec::new();

    for user_id in &user_order {
        let mut items = items_by_user.remove(user_id).unwrap_or_default();
        if items.len() < MIN_INTERACTIONS_FOR_HOLDOUT {
            train_rows.extend(items.into_iter().flat_map(|(_, rows)| rows));
            continue;
        }
        items.shuffle(&mut rng);
        test_pos.push(items[0].1[0]);
        validate_pos.push(items[1].1[0]);
        train_rows.extend(items.drain(2..).flat_map(|(_, rows)| rows));
    }
    train_rows.sort_unstable();

    let train: Vec<Interaction> = train_rows.iter().filter_map(|&i| table.row(i)).collect();
    debug!(
        "Held out {} users; {} training rows remain",
        test_pos.len(),
        train.len()
    );

    let seen = seen_items(table);
    let mut validate = Vec::with_capacity(options.n_test);
    let mut test = Vec::with_capacity(options.n_test);
    for _ in 0..options.n_test {
        validate.push(with_negatives(
            table,
            &validate_pos,
            &seen,
            &all_items,
            options.n_negative,
            &mut rng,
        ));
        test.push(with_negatives(
            table,
            &test_pos,
            &seen,
            &all_items,
            options.n_negative,
            &mut rng,
        ));
    }

    info!(
        "Leave-one-out split: {} train rows, {} validation sets, {} test sets",
        train.len(),
        validate.len(),
        test.len()
    );

    LeaveOneOutSplit {
        train: InteractionTable::from_rows(&train),
        validate,
        test,
    }
}

fn seen_items(table: &InteractionTable) -> HashMap<i64, HashSet<i64>> {
    let mut seen: HashMap<i64, HashSet<i64>> = HashMap::new();
    for row in table.rows() {
        seen.entry(row.user_id).or_default().insert(row.item_id);
    }
    seen
}

/// Each held-out positive followed by up to `n_negative` unseen items
fn with_negatives(
    table: &InteractionTable,
    positives: &[usize],
    seen: &HashMap<i64, HashSet<i64>>,
    all_items: &[i64],
    n_negative: usize,
    rng: &mut StdRng,
) -> InteractionTable {
    let mut rows = Vec::with_capacity(positives.len() * (n_negative + 1));
    for positive in positives.iter().filter_map(|&i| table.row(i)) {
        rows.push(positive);

        let candidates: Vec<i64> = match seen.get(&positive.user_id) {
            Some(items) => all_items
                .iter()
                .copied()
                .filter(|item| !items.contains(item))
                .collect(),
            None => all_items.to_vec(),
        };
        let amount = n_negative.min(candidates.len());
        for pick in index::sample(rng, candidates.len(), amount) {
            rows.push(Interaction {
                user_id: positive.user_id,
                item_id: candidates[pick],
                rating: NEGATIVE_RATING,
            });
        }
    }
    InteractionTable::from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(i64, i64)]) -> InteractionTable {
        let rows: Vec<Interaction> = rows
            .iter()
            .map(|&(user_id, item_id)| Interaction {
                user_id,
                item_id,
                rating: 1.0,
            })
            .collect();
        InteractionTable::from_rows(&rows)
    }

    fn options(n_negative: usize, n_test: usize) -> LeaveOneOutOptions {
        LeaveOneOutOptions {
            random: true,
            n_negative,
            n_test,
            seed: 7,
        }
    }

    #[test]
    fn test_small_users_stay_in_train() {
        let t = table(&[(1, 10), (1, 11), (2, 10)]);
        let split = random_leave_one_out(&t, &options(5, 1));
        assert_eq!(split.train.len(), 3);
        assert!(split.test[0].is_empty());
        assert!(split.validate[0].is_empty());
    }

    #[test]
    fn test_holds_out_one_per_eligible_user() {
        let t = table(&[(1, 10), (1, 11), (1, 12), (1, 13), (2, 10)]);
        let split = random_leave_one_out(&t, &options(0, 2));

        assert_eq!(split.train.len(), 3);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.validate.len(), 2);
        assert_eq!(split.test[0].len(), 1);
        assert_eq!(split.test[0].user_ids(), &[1]);

        let held_test = split.test[0].item_ids()[0];
        let held_valid = split.validate[0].item_ids()[0];
        assert_ne!(held_test, held_valid);
        for row in split.train.rows().filter(|r| r.user_id == 1) {
            assert_ne!(row.item_id, held_test);
            assert_ne!(row.item_id, held_valid);
        }
    }

    #[test]
    fn test_repeated_item_is_not_a_holdout() {
        let t = table(&[(1, 10), (1, 10), (1, 10)]);
        let split = random_leave_one_out(&t, &options(0, 1));
        assert_eq!(split.train.item_ids(), &[10, 10, 10]);
        assert!(split.test[0].is_empty());
    }

    #[test]
    fn test_held_out_item_leaves_train_entirely() {
        let t = table(&[(1, 10), (1, 10), (1, 11), (1, 11), (1, 12), (1, 12)]);
        let split = random_leave_one_out(&t, &options(0, 1));

        let held_test = split.test[0].item_ids()[0];
        let held_valid = split.validate[0].item_ids()[0];
        assert_eq!(split.train.len(), 2);
        assert!(split
            .train
            .item_ids()
            .iter()
            .all(|&item| item != held_test && item != held_valid));
    }

    #[test]
    fn test_negatives_are_unseen_items() {
        let t = table(&[(1, 10), (1, 11), (1, 12), (2, 13), (2, 14), (3, 15)]);
        let split = random_leave_one_out(&t, &options(2, 1));

        let test = &split.test[0];
        // one positive plus two negatives for user 1
        assert_eq!(test.len(), 3);
        for row in test.rows().skip(1) {
            assert_eq!(row.rating, NEGATIVE_RATING);
            assert!(![10, 11, 12].contains(&row.item_id));
        }
    }

    #[test]
    fn test_negatives_capped_by_candidates() {
        let t = table(&[(1, 10), (1, 11), (1, 12), (2, 13)]);
        let split = random_leave_one_out(&t, &options(100, 1));
        // only item 13 is unseen by user 1
        assert_eq!(split.test[0].len(), 2);
        assert_eq!(split.test[0].item_ids()[1], 13);
    }

    #[test]
    fn test_same_seed_same_split() {
        let t = table(&[(1, 10), (1, 11), (1, 12), (1, 13), (2, 14), (2, 15), (2, 16)]);
        let a = random_leave_one_out(&t, &options(2, 2));
        let b = random_leave_one_out(&t, &options(2, 2));
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
        assert_eq!(a.validate, b.validate);
    }
}
