use foundation::time::Time;

/// Metadata for a single animation frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the first frame was observed.
    pub elapsed_s: f64,
    /// Seconds since the previous frame (0 for the first).
    pub dt_s: f64,
}

/// Turns display-refresh timestamps into frames.
///
/// The first timestamp observed becomes the epoch; every later frame reports
/// elapsed time relative to it. Timestamps that run backwards are clamped so
/// elapsed time never decreases.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    start: Option<Time>,
    last_elapsed_s: f64,
    next_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Time) -> Frame {
        let start = *self.start.get_or_insert(now);
        let elapsed_s = now.since(start).max(self.last_elapsed_s);
        let frame = Frame {
            index: self.next_index,
            elapsed_s,
            dt_s: elapsed_s - self.last_elapsed_s,
        };
        self.last_elapsed_s = elapsed_s;
        self.next_index = self.next_index.wrapping_add(1);
        frame
    }
}
