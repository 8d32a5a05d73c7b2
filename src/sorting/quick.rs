use super::Counters;

/// Quick sort with Lomuto partitioning around the last element.
///
/// Recurses into the smaller partition and loops on the larger one, which
/// keeps the stack logarithmic on already-sorted input without changing the
/// comparisons or swaps performed.
pub(super) fn sort<T: PartialOrd + Clone>(mut data: &mut [T], counters: &mut Counters) {
    while data.len() > 1 {
        let pivot = partition(data, counters);
        let (left, right) = std::mem::take(&mut data).split_at_mut(pivot);
        let right = &mut right[1..];
        if left.len() < right.len() {
            sort(left, counters);
            data = right;
        } else {
            sort(right, counters);
            data = left;
        }
    }
}

/// Every `< pivot` hit swaps (self-swaps included) and the final pivot
/// placement always counts as one more swap.
fn partition<T: PartialOrd + Clone>(data: &mut [T], counters: &mut Counters) -> usize {
    let last = data.len() - 1;
    let pivot = data[last].clone();
    let mut store = 0;
    for j in 0..last {
        if counters.less(&data[j], &pivot) {
            counters.swap(data, store, j);
            store += 1;
        }
    }
    counters.swap(data, store, last);
    store
}
