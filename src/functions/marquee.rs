//! Back-and-forth scrolling window over a status string.

use std::iter::FusedIterator;

/// Infinite iterator of `(at_extreme, window)` pairs.
///
/// The window offset follows a triangle wave `0, 1, .., max, .., 1, 0, ..`
/// so one formula covers both scroll directions. `at_extreme` is set at the
/// two turning points. Text that fits the width is yielded unchanged and is
/// always at an extreme. Widths and offsets count Unicode scalar values.
///
/// Restart a scroll by building a new `Marquee`.
#[derive(Clone, Debug)]
pub struct Marquee {
    chars: Vec<char>,
    width: usize,
    max_offset: usize,
    index: usize,
}

impl Marquee {
    pub fn new(text: &str, width: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let max_offset = chars.len().saturating_sub(width);
        Self {
            chars,
            width,
            max_offset,
            index: 0,
        }
    }

    /// Offset of the window the next call to `next` will return.
    fn offset(&self) -> usize {
        self.max_offset - self.max_offset.abs_diff(self.index)
    }
}

impl Iterator for Marquee {
    type Item = (bool, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_offset == 0 {
            return Some((true, self.chars.iter().collect()));
        }

        let offset = self.offset();
        self.index = (self.index + 1) % (2 * self.max_offset);

        let window = self.chars[offset..offset + self.width].iter().collect();
        Some((offset == 0 || offset == self.max_offset, window))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl FusedIterator for Marquee {}
