use super::Counters;

/// Top-down merge sort.
///
/// No exchanges happen here, so the swap counter records every element taken
/// from the right half while both halves still have elements. Tail copies are
/// not counted. Labels in existing corpora depend on this exact convention.
pub(super) fn sort<T: PartialOrd + Clone>(data: &mut [T], counters: &mut Counters) {
    if data.len() <= 1 {
        return;
    }
    let mid = data.len() / 2;
    sort(&mut data[..mid], counters);
    sort(&mut data[mid..], counters);
    let merged = merge(&data[..mid], &data[mid..], counters);
    data.clone_from_slice(&merged);
}

fn merge<T: PartialOrd + Clone>(left: &[T], right: &[T], counters: &mut Counters) -> Vec<T> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if counters.less_eq(&left[i], &right[j]) {
            out.push(left[i].clone());
            i += 1;
        } else {
            out.push(right[j].clone());
            j += 1;
            counters.record_swap();
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_right_draws_inside_the_merge_loop_only() {
        // [2, 1]: one comparison, the right element is drawn first.
        let mut data = vec![2, 1];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(data, vec![1, 2]);
        assert_eq!((counters.comparisons, counters.swaps), (1, 1));

        // [1, 2]: left drawn, right copied as tail without a count.
        let mut data = vec![1, 2];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!((counters.comparisons, counters.swaps), (1, 0));
    }

    #[test]
    fn ties_prefer_the_left_half() {
        let mut data = vec![3, 3];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(counters.swaps, 0);
    }

    #[test]
    fn reversed_four_elements() {
        // [4,3] -> 1 cmp, 1 draw; [2,1] -> 1 cmp, 1 draw;
        // merge [3,4] with [1,2] -> 2 cmps, 2 draws.
        let mut data = vec![4, 3, 2, 1];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(data, vec![1, 2, 3, 4]);
        assert_eq!((counters.comparisons, counters.swaps), (4, 4));
    }
}
