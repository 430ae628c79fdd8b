// Bounded history of pc0.1 values (ring buffer, oldest dropped first).
//
// Non-finite samples are rejected so the least-squares fit never sees NaN.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild from a snapshot, keeping only the newest `capacity` values.
    pub fn from_values(capacity: usize, values: impl IntoIterator<Item = f64>) -> Self {
        let mut window = Self::new(capacity);
        for value in values {
            window.push(value);
        }
        window
    }

    /// Returns false when the sample was rejected.
    pub fn push(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        true
    }

    /// Values oldest → newest, contiguous for the trend fit.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_capacity() {
        let mut window = HistoryWindow::new(10);
        for i in 0..25 {
            window.push(i as f64);
            assert!(window.to_vec().len() <= 10);
        }
        assert_eq!(window.to_vec(), (15..25).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_non_finite_samples() {
        let mut window = HistoryWindow::new(3);
        assert!(!window.push(f64::NAN));
        assert!(!window.push(f64::INFINITY));
        assert!(window.push(5.0));
        assert_eq!(window.to_vec(), vec![5.0]);
    }

    #[test]
    fn from_values_keeps_newest() {
        let window = HistoryWindow::from_values(2, [1.0, 2.0, 3.0]);
        assert_eq!(window.to_vec(), vec![2.0, 3.0]);
    }
}
