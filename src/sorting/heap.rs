use super::Counters;

pub(super) fn sort<T: PartialOrd>(data: &mut [T], counters: &mut Counters) {
    let n = data.len();
    for start in (0..n / 2).rev() {
        sift_down(data, n, start, counters);
    }
    for end in (1..n).rev() {
        counters.swap(data, 0, end);
        sift_down(data, end, 0, counters);
    }
}

/// Restore the max-heap property below `root` within `data[..size]`.
/// A child comparison is only counted when that child exists.
fn sift_down<T: PartialOrd>(data: &mut [T], size: usize, mut root: usize, counters: &mut Counters) {
    loop {
        let mut largest = root;
        let left = 2 * root + 1;
        let right = left + 1;
        if left < size && counters.greater(&data[left], &data[largest]) {
            largest = left;
        }
        if right < size && counters.greater(&data[right], &data[largest]) {
            largest = right;
        }
        if largest == root {
            return;
        }
        counters.swap(data, root, largest);
        root = largest;
    }
}
