/// A half-open sample range `[start, end)` within one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    /// `None` unless `start < end <= len`.
    pub fn new(start: usize, end: usize, len: usize) -> Option<Self> {
        if start < end && end <= len {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Build from seconds, flooring each boundary to a sample index.
    ///
    /// The end is clamped to `len`, so a region dragged past the end of the
    /// waveform still selects up to the last sample.
    pub fn from_secs(start_secs: f64, end_secs: f64, sample_rate: u32, len: usize) -> Option<Self> {
        if !start_secs.is_finite() || !end_secs.is_finite() {
            return None;
        }
        let to_sample = |secs: f64| (secs.max(0.0) * f64::from(sample_rate)).floor() as usize;
        let start = to_sample(start_secs);
        let end = to_sample(end_secs).min(len);
        Self::new(start, end, len)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Whether this selection still fits a buffer of `len` samples.
    pub fn fits(&self, len: usize) -> bool {
        self.end <= len
    }
}
