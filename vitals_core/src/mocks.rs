//! Test and helper mocks for vitals_core

use std::marker::PhantomData;

/// A reader that always errors on read; useful for exercising sampler
/// lifecycle and retry paths without producing data.
pub struct NoopReader<T>(PhantomData<fn() -> T>);

impl<T> NoopReader<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NoopReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> vitals_traits::SampleReader for NoopReader<T> {
    type Sample = T;

    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop reader")))
    }
}

/// A reader that replays a fixed sequence, then repeats the last value.
pub struct SeqReader<T: Clone> {
    seq: Vec<T>,
    idx: usize,
}

impl<T: Clone> SeqReader<T> {
    pub fn new(seq: impl Into<Vec<T>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl<T: Clone> vitals_traits::SampleReader for SeqReader<T> {
    type Sample = T;

    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<T, Box<dyn std::error::Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx].clone();
            self.idx += 1;
            Some(x)
        } else {
            self.seq.last().cloned()
        };
        v.ok_or_else(|| "empty sequence".into())
    }
}
