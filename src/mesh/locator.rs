use super::element::MeshElement;
use super::node::MeshNode;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Finds the element containing a point, starting from the element found by the previous query
///
/// Successive queries (e.g. clicks, or points along a contour) tend to land near each other, and elements are
/// numbered in a banded order, so the search walks outward from the last hit in both directions.
/// The cursor is only a hint: any starting value gives the same answer.
#[derive(Debug, Default)]
pub struct ElementLocator {
    last: AtomicUsize,
}

impl Clone for ElementLocator {
    fn clone(&self) -> Self {
        Self::with_cursor(self.cursor())
    }
}

impl ElementLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A locator that starts its next search from element `k`
    pub fn with_cursor(k: usize) -> Self {
        Self {
            last: AtomicUsize::new(k),
        }
    }

    /// Element the next search starts from
    pub fn cursor(&self) -> usize {
        self.last.load(Ordering::Relaxed)
    }

    /// Start the next search from element `k`
    pub fn set_cursor(&self, k: usize) {
        self.last.store(k, Ordering::Relaxed);
    }

    /// Index of the element containing `(x, y)`
    ///
    /// Elements must already carry their bounding circles, as they do once owned by a `Mesh`.
    pub(crate) fn locate(
        &self,
        nodes: &[MeshNode],
        elements: &[MeshElement],
        x: f64,
        y: f64,
    ) -> Option<usize> {
        let sz = elements.len();
        if sz == 0 {
            return None;
        }

        let mut k = self.last.load(Ordering::Relaxed);
        if k >= sz {
            k = 0;
            self.last.store(0, Ordering::Relaxed);
        }

        if elements[k].contains(nodes, x, y) {
            return Some(k);
        }

        let candidate = |i: usize| -> bool {
            let elem = &elements[i];
            let dx = elem.ctr.re - x;
            let dy = elem.ctr.im - y;
            dx * dx + dy * dy <= elem.rsqr && elem.contains(nodes, x, y)
        };

        let mut hi = k;
        let mut lo = k;
        for _ in (0..sz).step_by(2) {
            hi = if hi + 1 >= sz { 0 } else { hi + 1 };
            lo = if lo == 0 { sz - 1 } else { lo - 1 };

            if candidate(hi) {
                self.last.store(hi, Ordering::Relaxed);
                return Some(hi);
            }
            if candidate(lo) {
                self.last.store(lo, Ordering::Relaxed);
                return Some(lo);
            }
        }

        log::debug!("no element contains ({}, {})", x, y);
        None
    }
}
