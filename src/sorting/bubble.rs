use super::Counters;

/// Full bubble sort: every pass runs to completion, no early exit.
pub(super) fn sort<T: PartialOrd>(data: &mut [T], counters: &mut Counters) {
    let n = data.len();
    for pass in 0..n.saturating_sub(1) {
        for j in 0..n - 1 - pass {
            if counters.greater(&data[j], &data[j + 1]) {
                counters.swap(data, j, j + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_input_is_fully_quadratic() {
        let mut data = vec![5, 4, 3, 2, 1];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(data, vec![1, 2, 3, 4, 5]);
        assert_eq!(counters.comparisons, 10);
        assert_eq!(counters.swaps, 10);
    }

    #[test]
    fn sorted_input_still_compares_every_pair() {
        let mut data = vec![1, 2, 3, 4];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(counters.comparisons, 6);
        assert_eq!(counters.swaps, 0);
    }
}
