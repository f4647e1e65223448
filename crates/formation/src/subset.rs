use rand::prelude::*;
use rand::rngs::StdRng;

/// Picks at most `cap` items. When everything fits the input is returned
/// as-is; otherwise a shuffled copy is truncated, which is a uniform sample
/// without replacement.
pub fn select_display_subset<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    cap: usize,
    rng: &mut R,
) -> Vec<T> {
    if items.len() <= cap {
        return items.to_vec();
    }
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy.truncate(cap);
    copy
}

/// Memoised display subset keyed on the source revision and the cap.
///
/// The owner bumps its revision on every mutation; as long as neither the
/// revision nor the cap changes, [`DisplaySubset::resolve`] hands back the
/// previous selection without touching the generator.
#[derive(Debug)]
pub struct DisplaySubset<T> {
    rng: StdRng,
    key: Option<(u64, usize)>,
    selection: Vec<T>,
    recomputations: u64,
}

impl<T: Clone> DisplaySubset<T> {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            key: None,
            selection: Vec::new(),
            recomputations: 0,
        }
    }

    pub fn resolve(&mut self, revision: u64, items: &[T], cap: usize) -> &[T] {
        let key = (revision, cap);
        if self.key != Some(key) {
            self.selection = select_display_subset(items, cap, &mut self.rng);
            self.key = Some(key);
            self.recomputations += 1;
            tracing::debug!(
                total = items.len(),
                cap,
                shown = self.selection.len(),
                "recomputed display subset"
            );
        }
        &self.selection
    }

    /// Last resolved selection, empty before the first `resolve`.
    pub fn current(&self) -> &[T] {
        &self.selection
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_min_of_len_and_cap() {
        let mut rng = StdRng::seed_from_u64(5);
        let items: Vec<u32> = (0..12).collect();
        for cap in 1..20 {
            let subset = select_display_subset(&items, cap, &mut rng);
            assert_eq!(subset.len(), cap.min(items.len()));
        }
    }

    #[test]
    fn keeps_order_when_everything_fits() {
        let mut rng = StdRng::seed_from_u64(5);
        let items = vec!["a", "b", "c"];
        assert_eq!(select_display_subset(&items, 3, &mut rng), items);
        assert_eq!(select_display_subset(&items, 10, &mut rng), items);
    }

    #[test]
    fn sample_has_no_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let items: Vec<u32> = (0..50).collect();
        let mut subset = select_display_subset(&items, 10, &mut rng);
        subset.sort_unstable();
        subset.dedup();
        assert_eq!(subset.len(), 10);
    }

    #[test]
    fn sample_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(2024);
        let items: Vec<usize> = (0..10).collect();
        let mut hits = [0u32; 10];
        for _ in 0..10_000 {
            for picked in select_display_subset(&items, 3, &mut rng) {
                hits[picked] += 1;
            }
        }
        // Expected 3000 per item.
        for count in hits {
            assert!((2700..3300).contains(&count), "skewed sample: {hits:?}");
        }
    }

    #[test]
    fn memoised_until_revision_or_cap_changes() {
        let items: Vec<u32> = (0..20).collect();
        let mut subset = DisplaySubset::new(1);
        let first = subset.resolve(1, &items, 5).to_vec();
        let again = subset.resolve(1, &items, 5).to_vec();
        assert_eq!(first, again);
        assert_eq!(subset.recomputations(), 1);

        subset.resolve(1, &items, 6);
        assert_eq!(subset.recomputations(), 2);
        subset.resolve(2, &items, 6);
        assert_eq!(subset.recomputations(), 3);
        assert_eq!(subset.current().len(), 6);
    }

    #[test]
    fn seeded_selection_replays() {
        let items: Vec<u32> = (0..30).collect();
        let mut a = DisplaySubset::new(77);
        let mut b = DisplaySubset::new(77);
        assert_eq!(a.resolve(1, &items, 4), b.resolve(1, &items, 4));
    }
}
