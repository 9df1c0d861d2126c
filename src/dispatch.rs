//! Ordered first-match dispatch.
//!
//! A [`Dispatcher`] walks a fixed, ordered list of matchers and returns the
//! output of the first one that recognises the input. Later matchers are never
//! consulted once one has matched, so callers register specific matchers
//! before general fallbacks.
//!
//! The line decoder ([`crate::decoder`]) and the symbol name resolver
//! ([`crate::symbols`]) are both built on this primitive.

/// Something that may recognise a piece of text.
pub trait Matcher {
    /// What a successful match produces
    type Output;

    /// Return `Some` if this matcher recognises `input`
    fn try_match(&self, input: &str) -> Option<Self::Output>;
}

/// An ordered list of matchers evaluated first-match-wins.
#[derive(Debug)]
pub struct Dispatcher<'a, M> {
    matchers: &'a [M],
}

impl<M> Clone for Dispatcher<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Dispatcher<'_, M> {}

impl<'a, M: Matcher> Dispatcher<'a, M> {
    /// Create a dispatcher over `matchers`, tried in slice order
    pub fn new(matchers: &'a [M]) -> Self {
        Self { matchers }
    }

    /// Output of the first matcher recognising `input`
    pub fn dispatch(&self, input: &str) -> Option<M::Output> {
        self.matchers.iter().find_map(|m| m.try_match(input))
    }

    /// Like [`dispatch`](Self::dispatch), also returning the winning matcher
    pub fn dispatch_with(&self, input: &str) -> Option<(&'a M, M::Output)> {
        self.matchers
            .iter()
            .find_map(|m| m.try_match(input).map(|out| (m, out)))
    }

    /// The matchers in evaluation order
    pub fn matchers(&self) -> &'a [M] {
        self.matchers
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
