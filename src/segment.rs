//! Splitting a buffer at its escape points.
//!
//! [`Segments`] is the loop an encoder runs around the scanner: copy the
//! clean run verbatim, handle the one byte that needs escaping, repeat. The
//! expansion of that byte (`\n`, `&`, ...) is left to the caller.

use core::iter::FusedIterator;

use crate::Scanner;

/// A piece of the input, as yielded by [`Segments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A maximal run of bytes that need no escaping.
    Literal(&'a [u8]),
    /// A single byte that needs escaping.
    Escape(u8),
}

impl<'a> Segment<'a> {
    /// The input bytes this segment covers.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Segment::Literal(bytes) => bytes,
            Segment::Escape(b) => core::slice::from_ref(b),
        }
    }

    /// The number of input bytes this segment covers.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Segment::Literal(bytes) => bytes.len(),
            Segment::Escape(_) => 1,
        }
    }

    /// Always `false`: literals are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// An iterator over the [`Segment`]s of a byte slice.
///
/// Created by [`segments`](crate::segments) or [`Scanner::segments`].
/// Concatenating the bytes of every segment reproduces the input.
#[derive(Clone, Debug)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Segments<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) scanner: Scanner,
}

impl<'a> Segments<'a> {
    /// The part of the input not yet yielded.
    #[inline]
    pub fn remainder(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (&first, rest) = self.bytes.split_first()?;

        if self.scanner.set().contains(first) {
            // An escapable byte is at the beginning of the slice.
            self.bytes = rest;
            return Some(Segment::Escape(first));
        }

        // The first byte is clean, so the literal is at least one byte long.
        let (literal, rest) = self.scanner.split_at_escape(self.bytes);
        self.bytes = rest;
        Some(Segment::Literal(literal))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.bytes.is_empty() {
            (0, Some(0))
        } else {
            // At least one segment, at most one per byte.
            (1, Some(self.bytes.len()))
        }
    }
}

impl FusedIterator for Segments<'_> {}
