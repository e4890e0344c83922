//! Fixed-size partitioning of playlists into batches

use std::num::NonZeroUsize;

/// Split `items` into consecutive batches of `size`
///
/// Every batch holds exactly `size` items except possibly the last. An empty
/// input produces no batches. Order is preserved.
pub fn partition<T>(items: Vec<T>, size: NonZeroUsize) -> Vec<Vec<T>> {
    let mut batches = Vec::with_capacity(items.len().div_ceil(size.get()));
    let mut iter = items.into_iter().peekable();

    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(size.get()).collect());
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test_case(25, 12, &[12, 12, 1] ; "remainder")]
    #[test_case(24, 12, &[12, 12] ; "exact")]
    #[test_case(5, 12, &[5] ; "single short batch")]
    #[test_case(0, 12, &[] ; "empty")]
    #[test_case(3, 1, &[1, 1, 1] ; "size one")]
    fn test_partition_sizes(n: usize, batch_size: usize, expected: &[usize]) {
        let items: Vec<usize> = (0..n).collect();
        let batches = partition(items, size(batch_size));
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, expected);
    }

    #[test]
    fn test_partition_preserves_order() {
        let items: Vec<u32> = (0..30).collect();
        let batches = partition(items.clone(), size(7));
        let flattened: Vec<u32> = batches.into_iter().flatten().collect();
        assert_eq!(flattened, items);
    }
}
