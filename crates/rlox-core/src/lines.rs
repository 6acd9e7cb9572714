//! Run-length encoded line table (byte offset → source line).
//!
//! Consecutive bytes nearly always come from the same source line, so the
//! table stores `(line, count)` runs instead of one line per byte. Flushed
//! runs are packed into a [`LineRun`]: 8-bit count in the high byte, 24-bit
//! line in the low bits. The 8-bit count caps a run at 255 bytes even when
//! the line does not change; this is part of the format.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::push_grow;

/// Largest line number representable in a packed run.
pub const MAX_LINE: u32 = 0x00FF_FFFF;

/// Largest byte count of a single run.
pub const MAX_RUN: u8 = u8::MAX;

/// One flushed run, `count << 24 | line`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineRun(u32);

impl LineRun {
    /// Pack a run. `line` is clamped to [`MAX_LINE`].
    pub const fn new(line: u32, count: u8) -> Self {
        let line = if line > MAX_LINE { MAX_LINE } else { line };
        LineRun(((count as u32) << 24) | line)
    }

    /// Source line of the run.
    pub const fn line(self) -> u32 { self.0 & MAX_LINE }

    /// Number of bytes covered, `1..=255` for flushed runs.
    pub const fn count(self) -> u8 { (self.0 >> 24) as u8 }

    /// Packed representation.
    pub const fn to_bits(self) -> u32 { self.0 }

    /// Unpack a raw word produced by [`LineRun::to_bits`].
    pub const fn from_bits(bits: u32) -> Self { LineRun(bits) }
}

impl fmt::Debug for LineRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineRun(line={}, count={})", self.line(), self.count())
    }
}

/// Line table with an in-progress run that has not been packed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    runs: Vec<LineRun>,
    current_line: u32,
    /// 0 means no run in progress.
    current_count: u8,
}

impl LineTable {
    /// Empty table.
    pub const fn new() -> Self {
        Self { runs: Vec::new(), current_line: 0, current_count: 0 }
    }

    /// Record the line of the next byte.
    ///
    /// Lines above [`MAX_LINE`] are stored as [`MAX_LINE`] and reported at `warn`.
    pub fn push(&mut self, line: u32) {
        if line > MAX_LINE {
            #[cfg(feature = "trace")]
            log::warn!("line {line} exceeds {MAX_LINE}, recorded as {MAX_LINE}");
        }
        let line = line.min(MAX_LINE);
        if self.current_count == MAX_RUN
            || (self.current_count > 0 && self.current_line != line)
        {
            push_grow(&mut self.runs, LineRun::new(self.current_line, self.current_count));
            self.current_count = 0;
        }
        self.current_line = line;
        self.current_count += 1;
    }

    /// Line of the byte at `index`, `None` past the end.
    pub fn line(&self, index: usize) -> Option<u32> {
        let mut end = 0usize;
        for run in &self.runs {
            end += usize::from(run.count());
            if index < end {
                return Some(run.line());
            }
        }
        (index < end + usize::from(self.current_count)).then_some(self.current_line)
    }

    /// Number of bytes covered (flushed runs plus the pending run).
    pub fn len(&self) -> usize {
        self.flushed_len() + usize::from(self.current_count)
    }

    /// True when no line has been recorded.
    pub fn is_empty(&self) -> bool { self.current_count == 0 && self.runs.is_empty() }

    /// Packed runs, oldest first. Excludes the pending run.
    pub fn runs(&self) -> &[LineRun] { &self.runs }

    /// The run still being accumulated, as `(line, count)`.
    pub fn pending(&self) -> Option<(u32, u8)> {
        (self.current_count > 0).then_some((self.current_line, self.current_count))
    }

    /// Every run including the pending one, as `(line, count)`.
    pub fn iter_runs(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.runs
            .iter()
            .map(|r| (r.line(), r.count()))
            .chain(self.pending())
    }

    /// Drop every run.
    pub fn clear(&mut self) { *self = Self::new(); }

    fn flushed_len(&self) -> usize {
        self.runs.iter().map(|r| usize::from(r.count())).sum()
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn packing() {
        let run = LineRun::new(123, 7);
        assert_eq!(run.to_bits(), (7 << 24) | 123);
        assert_eq!(run.line(), 123);
        assert_eq!(run.count(), 7);
        assert_eq!(LineRun::from_bits(run.to_bits()), run);
        assert_eq!(LineRun::new(u32::MAX, 1).line(), MAX_LINE);
    }

    #[test]
    fn same_line_stays_pending() {
        let mut t = LineTable::new();
        for _ in 0..10 {
            t.push(4);
        }
        assert!(t.runs().is_empty());
        assert_eq!(t.pending(), Some((4, 10)));
        assert_eq!(t.len(), 10);
        assert_eq!(t.line(9), Some(4));
        assert_eq!(t.line(10), None);
    }

    #[test]
    fn line_change_flushes() {
        let mut t = LineTable::new();
        t.push(1);
        t.push(1);
        t.push(2);
        t.push(1);
        assert_eq!(t.runs(), &[LineRun::new(1, 2), LineRun::new(2, 1)]);
        assert_eq!(t.pending(), Some((1, 1)));
        assert_eq!(
            (0..4).map(|i| t.line(i)).collect::<Vec<_>>(),
            vec![Some(1), Some(1), Some(2), Some(1)]
        );
    }

    #[test]
    fn run_is_capped_at_255() {
        let mut t = LineTable::new();
        for _ in 0..600 {
            t.push(9);
        }
        assert_eq!(t.runs(), &[LineRun::new(9, 255), LineRun::new(9, 255)]);
        assert_eq!(t.pending(), Some((9, 90)));
        assert_eq!(t.line(254), Some(9));
        assert_eq!(t.line(255), Some(9));
        assert_eq!(t.line(599), Some(9));
    }

    #[test]
    fn oversized_lines_are_clamped() {
        let mut t = LineTable::new();
        t.push(0x0100_0005);
        t.push(MAX_LINE);
        t.push(7);
        assert_eq!(t.line(0), Some(MAX_LINE));
        assert_eq!(t.line(1), Some(MAX_LINE));
        assert_eq!(t.line(2), Some(7));
        assert_eq!(t.runs(), &[LineRun::new(MAX_LINE, 2)]);
    }

    #[test]
    fn empty_table() {
        let t = LineTable::new();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.line(0), None);
        assert_eq!(t.iter_runs().count(), 0);
    }

    proptest! {
        #[test]
        fn decodes_every_pushed_line(lines in proptest::collection::vec(0u32..6, 0..1200)) {
            let mut t = LineTable::new();
            for (i, &line) in lines.iter().enumerate() {
                t.push(line);
                prop_assert_eq!(t.len(), i + 1);
            }
            for (i, &line) in lines.iter().enumerate() {
                prop_assert_eq!(t.line(i), Some(line));
            }
            prop_assert_eq!(t.line(lines.len()), None);
        }

        #[test]
        fn runs_stay_in_bounds(lines in proptest::collection::vec(0u32..3, 1..2000)) {
            let mut t = LineTable::new();
            for &line in &lines {
                t.push(line);
                let flushed: usize = t.runs().iter().map(|r| usize::from(r.count())).sum();
                let (_, pending) = t.pending().unwrap_or((0, 0));
                prop_assert_eq!(flushed + usize::from(pending), t.len());
                prop_assert!(t.runs().iter().all(|r| r.count() >= 1));
            }
        }
    }
}
