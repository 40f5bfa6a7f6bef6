//! Fixed-capacity rolling window with an O(1) running sum.
//!
//! Backing storage is allocated once; pushing into a full window overwrites
//! the oldest slot.

#[derive(Debug, Clone)]
pub struct RollingWindow {
    buf: Vec<f64>,
    head: usize,
    len: usize,
    sum: f64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            buf: vec![0.0; capacity],
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// Push a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let cap = self.buf.len();
        let evicted = if self.is_full() {
            let old = self.buf[self.head];
            self.sum -= old;
            Some(old)
        } else {
            self.len += 1;
            None
        };
        self.buf[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % cap;
        evicted
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the current contents; NaN until the window is full.
    pub fn mean(&self) -> f64 {
        if self.is_full() {
            self.sum / self.len as f64
        } else {
            f64::NAN
        }
    }

    /// Oldest value still in the window.
    pub fn oldest(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let cap = self.buf.len();
        let idx = (self.head + cap - self.len) % cap;
        Some(self.buf[idx])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_is_nan_until_full() {
        let mut w = RollingWindow::new(3);
        w.push(1.0);
        w.push(2.0);
        assert!(w.mean().is_nan());
        w.push(3.0);
        assert_eq!(w.mean(), 2.0);
    }

    #[test]
    fn push_evicts_oldest() {
        let mut w = RollingWindow::new(2);
        assert_eq!(w.push(1.0), None);
        assert_eq!(w.push(2.0), None);
        assert_eq!(w.push(5.0), Some(1.0));
        assert_eq!(w.sum(), 7.0);
        assert_eq!(w.oldest(), Some(2.0));
    }

    #[test]
    fn clear_resets() {
        let mut w = RollingWindow::new(2);
        w.push(4.0);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.oldest(), None);
        assert_eq!(w.sum(), 0.0);
    }
}
