// src/core/permutator.rs

//! Lazy cartesian product over pattern axes.
//!
//! Axes are walked in key order and the last axis varies fastest, exactly
//! like nested `for` loops written in that order.

use super::pattern::{Pattern, PatternCombination, PatternKey};

/// A restartable, finite iterator over every [`PatternCombination`] of a set of axes.
#[derive(Debug, Clone)]
pub struct Permutator {
    axes: Vec<(PatternKey, Vec<String>)>,
    /// One cursor per axis; `None` once the product is exhausted.
    cursor: Option<Vec<usize>>,
}

impl Permutator {
    /// Builds a permutator over `(key, values)` axes.
    ///
    /// Duplicate keys keep their last values. An axis without values makes the product empty.
    pub fn new<I>(axes: I) -> Self
    where
        I: IntoIterator<Item = (PatternKey, Vec<String>)>,
    {
        let mut sorted: Vec<(PatternKey, Vec<String>)> = Vec::new();
        for (key, values) in axes {
            match sorted.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = values,
                None => sorted.push((key, values)),
            }
        }
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let cursor = initial_cursor(&sorted);
        Self { axes: sorted, cursor }
    }

    /// Builds a permutator over the values of `patterns`.
    pub fn from_patterns<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = &'a Pattern>,
    {
        Self::new(
            patterns
                .into_iter()
                .map(|p| (p.key().to_string(), p.values().to_vec())),
        )
    }

    /// Number of combinations in the full product, regardless of progress.
    pub fn total(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    /// Rewinds the iterator to the first combination.
    pub fn restart(&mut self) {
        self.cursor = initial_cursor(&self.axes);
    }

    fn current(&self, cursor: &[usize]) -> PatternCombination {
        self.axes
            .iter()
            .zip(cursor)
            .filter_map(|((key, values), &i)| values.get(i).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    /// Moves the cursor like an odometer. Returns false once every axis wrapped.
    fn advance(&self, cursor: &mut [usize]) -> bool {
        for (position, (_, values)) in cursor.iter_mut().zip(&self.axes).rev() {
            *position += 1;
            if *position < values.len() {
                return true;
            }
            *position = 0;
        }
        false
    }
}

fn initial_cursor(axes: &[(PatternKey, Vec<String>)]) -> Option<Vec<usize>> {
    if axes.iter().any(|(_, values)| values.is_empty()) {
        return None;
    }
    Some(vec![0; axes.len()])
}

impl Iterator for Permutator {
    type Item = PatternCombination;

    fn next(&mut self) -> Option<Self::Item> {
        let mut cursor = self.cursor.take()?;
        let combination = self.current(&cursor);
        if self.advance(&mut cursor) {
            self.cursor = Some(cursor);
        }
        Some(combination)
    }
}

// MARK: --- UNIT TESTS ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn axis(key: &str, values: &[&str]) -> (PatternKey, Vec<String>) {
        (key.to_string(), values.iter().map(|s| s.to_string()).collect())
    }

    fn combination(pairs: &[(&str, &str)]) -> PatternCombination {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_zero_axes_yield_one_empty_combination() {
        let all: Vec<_> = Permutator::new(Vec::new()).collect();
        assert_eq!(all, vec![PatternCombination::new()]);
    }

    #[test]
    fn test_product_size_and_distinctness() {
        let permutator = Permutator::new(vec![
            axis("COMPILER", &["gcc", "clang"]),
            axis("MODE", &["debug", "release", "asan"]),
            axis("ARCH", &["x86", "arm"]),
        ]);
        assert_eq!(permutator.total(), 12);

        let all: Vec<_> = permutator.collect();
        assert_eq!(all.len(), 12);
        assert!(all.iter().all(|c| c.len() == 3));
        let unique: HashSet<Vec<(String, String)>> = all
            .iter()
            .map(|c| c.clone().into_iter().collect())
            .collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn test_order_is_key_sorted_with_last_axis_fastest() {
        let all: Vec<_> = Permutator::new(vec![
            axis("MODE", &["debug", "release"]),
            axis("COMPILER", &["gcc", "clang"]),
        ])
        .collect();

        assert_eq!(
            all,
            vec![
                combination(&[("COMPILER", "gcc"), ("MODE", "debug")]),
                combination(&[("COMPILER", "gcc"), ("MODE", "release")]),
                combination(&[("COMPILER", "clang"), ("MODE", "debug")]),
                combination(&[("COMPILER", "clang"), ("MODE", "release")]),
            ]
        );
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let mut permutator = Permutator::new(vec![axis("A", &["1"]), axis("B", &[])]);
        assert_eq!(permutator.total(), 0);
        assert_eq!(permutator.next(), None);
    }

    #[test]
    fn test_restart() {
        let mut permutator = Permutator::new(vec![axis("A", &["1", "2"])]);
        assert_eq!(permutator.by_ref().count(), 2);
        assert_eq!(permutator.next(), None);

        permutator.restart();
        assert_eq!(permutator.count(), 2);
    }
}
