//! Fixed-capacity rings backing the vital estimator.
//!
//! Both rings allocate once at construction and never grow; `len()` saturates
//! at `capacity()`.

/// Which PPG channel to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Ir,
}

/// Circular buffer of raw, DC and AC values per channel plus timestamps.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    red_raw: Box<[u32]>,
    ir_raw: Box<[u32]>,
    red_dc: Box<[f32]>,
    ir_dc: Box<[f32]>,
    red_ac: Box<[f32]>,
    ir_ac: Box<[f32]>,
    t_us: Box<[u64]>,
    /// Next write position.
    head: usize,
    count: usize,
}

/// One row read back from a [`SignalBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalPoint {
    pub red_raw: u32,
    pub ir_raw: u32,
    pub red_dc: f32,
    pub ir_dc: f32,
    pub red_ac: f32,
    pub ir_ac: f32,
    pub t_us: u64,
}

impl SignalBuffer {
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            red_raw: vec![0; cap].into_boxed_slice(),
            ir_raw: vec![0; cap].into_boxed_slice(),
            red_dc: vec![0.0; cap].into_boxed_slice(),
            ir_dc: vec![0.0; cap].into_boxed_slice(),
            red_ac: vec![0.0; cap].into_boxed_slice(),
            ir_ac: vec![0.0; cap].into_boxed_slice(),
            t_us: vec![0; cap].into_boxed_slice(),
            head: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.t_us.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Store a full row at the write cursor and advance it.
    pub fn push(&mut self, p: SignalPoint) {
        let i = self.head;
        self.red_raw[i] = p.red_raw;
        self.ir_raw[i] = p.ir_raw;
        self.red_dc[i] = p.red_dc;
        self.ir_dc[i] = p.ir_dc;
        self.red_ac[i] = p.red_ac;
        self.ir_ac[i] = p.ir_ac;
        self.t_us[i] = p.t_us;
        self.head = (self.head + 1) % self.capacity();
        self.count = (self.count + 1).min(self.capacity());
    }

    /// Physical index of the `back`-th most recent row (0 = newest).
    fn index_back(&self, back: usize) -> Option<usize> {
        if back >= self.count {
            return None;
        }
        let cap = self.capacity();
        Some((self.head + cap - 1 - back) % cap)
    }

    pub fn get_back(&self, back: usize) -> Option<SignalPoint> {
        let i = self.index_back(back)?;
        Some(SignalPoint {
            red_raw: self.red_raw[i],
            ir_raw: self.ir_raw[i],
            red_dc: self.red_dc[i],
            ir_dc: self.ir_dc[i],
            red_ac: self.red_ac[i],
            ir_ac: self.ir_ac[i],
            t_us: self.t_us[i],
        })
    }

    pub fn ac_back(&self, ch: Channel, back: usize) -> Option<f32> {
        let i = self.index_back(back)?;
        Some(match ch {
            Channel::Red => self.red_ac[i],
            Channel::Ir => self.ir_ac[i],
        })
    }

    /// AC values of the newest `n` rows (fewer if not yet buffered), newest first.
    pub fn recent_ac(&self, ch: Channel, n: usize) -> impl Iterator<Item = f32> + '_ {
        (0..n.min(self.count)).filter_map(move |k| self.ac_back(ch, k))
    }

    /// Root-mean-square of the newest `n` AC values; zero when empty.
    pub fn ac_rms(&self, ch: Channel, n: usize) -> f32 {
        let take = n.min(self.count);
        if take == 0 {
            return 0.0;
        }
        let sum_sq: f32 = self.recent_ac(ch, take).map(|v| v * v).sum();
        (sum_sq / take as f32).sqrt()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }
}

/// Ring of inter-beat intervals with the time each closing beat was seen.
#[derive(Debug, Clone)]
pub struct HeartBeatHistory {
    intervals_ms: Box<[f32]>,
    t_us: Box<[u64]>,
    head: usize,
    count: usize,
}

impl HeartBeatHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            intervals_ms: vec![0.0; cap].into_boxed_slice(),
            t_us: vec![0; cap].into_boxed_slice(),
            head: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.intervals_ms.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn push(&mut self, interval_ms: f32, t_us: u64) {
        self.intervals_ms[self.head] = interval_ms;
        self.t_us[self.head] = t_us;
        self.head = (self.head + 1) % self.capacity();
        self.count = (self.count + 1).min(self.capacity());
    }

    /// Newest `n` intervals in milliseconds, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = f32> + '_ {
        let cap = self.capacity();
        (0..n.min(self.count)).map(move |k| self.intervals_ms[(self.head + cap - 1 - k) % cap])
    }

    /// Time of the newest recorded beat.
    pub fn last_t_us(&self) -> Option<u64> {
        if self.count == 0 {
            return None;
        }
        let cap = self.capacity();
        Some(self.t_us[(self.head + cap - 1) % cap])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ir_ac: f32, t_us: u64) -> SignalPoint {
        SignalPoint {
            ir_ac,
            t_us,
            ..SignalPoint::default()
        }
    }

    #[test]
    fn wraps_and_reads_newest_first() {
        let mut b = SignalBuffer::with_capacity(3);
        for i in 0..5u64 {
            b.push(point(i as f32, i));
        }
        assert_eq!(b.len(), 3);
        assert_eq!(b.capacity(), 3);
        let v: Vec<f32> = b.recent_ac(Channel::Ir, 10).collect();
        assert_eq!(v, vec![4.0, 3.0, 2.0]);
        assert_eq!(b.get_back(3), None);
    }

    #[test]
    fn rms_over_window() {
        let mut b = SignalBuffer::with_capacity(8);
        assert_eq!(b.ac_rms(Channel::Ir, 4), 0.0);
        for v in [100.0, -3.0, 4.0, -3.0, 4.0] {
            b.push(point(v, 0));
        }
        // newest four: 4, -3, 4, -3
        assert!((b.ac_rms(Channel::Ir, 4) - 12.5f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn history_keeps_newest() {
        let mut h = HeartBeatHistory::with_capacity(2);
        assert_eq!(h.last_t_us(), None);
        h.push(800.0, 1);
        h.push(810.0, 2);
        h.push(820.0, 3);
        assert_eq!(h.len(), 2);
        assert_eq!(h.recent(5).collect::<Vec<_>>(), vec![820.0, 810.0]);
        assert_eq!(h.last_t_us(), Some(3));
        h.clear();
        assert!(h.is_empty());
    }
}
