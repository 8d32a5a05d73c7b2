use super::Counters;

pub(super) fn sort<T: PartialOrd>(data: &mut [T], counters: &mut Counters) {
    let n = data.len();
    for i in 0..n.saturating_sub(1) {
        let mut min = i;
        for j in i + 1..n {
            if counters.less(&data[j], &data[min]) {
                min = j;
            }
        }
        if min != i {
            counters.swap(data, i, min);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_only_when_minimum_moved() {
        let mut data = vec![1, 3, 2];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(data, vec![1, 2, 3]);
        assert_eq!(counters.comparisons, 3);
        assert_eq!(counters.swaps, 1);
    }

    #[test]
    fn equal_elements_never_swap() {
        let mut data = vec![4, 4, 4, 4];
        let mut counters = Counters::default();
        sort(&mut data, &mut counters);
        assert_eq!(counters.comparisons, 6);
        assert_eq!(counters.swaps, 0);
    }
}
