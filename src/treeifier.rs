//! Hierarchy reconstruction from a flat record stream.
//!
//! ODB++ encodes containment purely through order: a surface is opened by
//! one record, followed by polygons (each opened, filled with segments and
//! closed), and finally closed by another record. The [`Treeifier`] rebuilds
//! that nesting in a single forward pass with an explicit stack.
//!
//! Each record kind maps to at most one [`TreeifyAction`]:
//!
//! - `Push(kind)` opens a new container; the record becomes its opening record
//! - `Leaf(field)` appends the record to `field` of the open container, or to
//!   the root when nothing is open
//! - `Pop(field)` closes the open container and appends it to `field` of the
//!   container below it, or to the root
//!
//! Records whose kind has no rule pass through as root-level leaves, so several
//! record families can share one stream. A `Pop` with nothing open, or a
//! container still open at the end of input, is an [`OdbError::Hierarchy`].
//! There is no implicit auto-close. Hierarchy errors name the section and
//! the source line of the offending record when the records carry one (see
//! [`Located`]).

use crate::decoder::Located;
use crate::error::{OdbError, Result};
use indexmap::IndexMap;
use std::fmt;

/// Records that expose a kind the treeifier can look up rules for
pub trait Classify {
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    /// Line number and text the record was decoded from, if known
    fn source(&self) -> Option<(usize, &str)> {
        None
    }
}

impl<R: Classify> Classify for Located<R> {
    type Kind = R::Kind;

    fn kind(&self) -> Self::Kind {
        self.record.kind()
    }

    fn source(&self) -> Option<(usize, &str)> {
        Some((self.line_number, self.line.as_str()))
    }
}

/// What the treeifier does with a record of a given kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeifyAction<C> {
    /// Open a container of this kind
    Push(C),
    /// Close the open container and attach it under this field of its parent
    Pop(&'static str),
    /// Attach the record under this field of the open container
    Leaf(&'static str),
}

/// Associates a record kind with its action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeifyRule<K, C> {
    pub kind: K,
    pub action: TreeifyAction<C>,
}

impl<K, C> TreeifyRule<K, C> {
    pub const fn new(kind: K, action: TreeifyAction<C>) -> Self {
        Self { kind, action }
    }
}

/// A node of the reconstructed forest
#[derive(Debug, Clone, PartialEq)]
pub enum Node<R, C> {
    Leaf(R),
    Container(Container<R, C>),
}

/// A closed container. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Container<R, C> {
    kind: C,
    opening: R,
    fields: IndexMap<&'static str, Vec<Node<R, C>>>,
}

impl<R, C> Container<R, C> {
    pub fn kind(&self) -> &C {
        &self.kind
    }

    /// The record that opened this container
    pub fn opening(&self) -> &R {
        &self.opening
    }

    /// Children attached under `field`, in stream order
    pub fn children(&self, field: &str) -> &[Node<R, C>] {
        self.fields.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All fields with their children, in first-attach order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[Node<R, C>])> {
        self.fields.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Decompose into kind, opening record and fields
    pub fn into_parts(self) -> (C, R, IndexMap<&'static str, Vec<Node<R, C>>>) {
        (self.kind, self.opening, self.fields)
    }
}

struct OpenContainer<R, C> {
    kind: C,
    position: usize,
    opening: R,
    fields: IndexMap<&'static str, Vec<Node<R, C>>>,
}

impl<R, C> OpenContainer<R, C> {
    fn attach(&mut self, field: &'static str, node: Node<R, C>) {
        self.fields.entry(field).or_default().push(node);
    }

    fn close(self) -> Container<R, C> {
        Container {
            kind: self.kind,
            opening: self.opening,
            fields: self.fields,
        }
    }
}

/// Applies an ordered rule set to record streams
#[derive(Debug, Clone, Copy)]
pub struct Treeifier<'r, K, C> {
    rules: &'r [TreeifyRule<K, C>],
    section: &'r str,
}

impl<'r, K, C> Treeifier<'r, K, C>
where
    K: Copy + Eq + fmt::Debug,
    C: Copy + fmt::Debug,
{
    pub fn new(rules: &'r [TreeifyRule<K, C>]) -> Self {
        Self { rules, section: "" }
    }

    /// Name of the section the records come from, reported in errors
    pub fn with_section(mut self, section: &'r str) -> Self {
        self.section = section;
        self
    }

    /// Action of the first rule registered for `kind`
    pub fn action_for(&self, kind: K) -> Option<TreeifyAction<C>> {
        self.rules.iter().find(|r| r.kind == kind).map(|r| r.action)
    }

    /// Build the forest for an infallible record stream
    pub fn treeify<R, I>(&self, records: I) -> Result<Vec<Node<R, C>>>
    where
        R: Classify<Kind = K>,
        I: IntoIterator<Item = R>,
    {
        self.try_treeify(records.into_iter().map(Ok))
    }

    /// Build the forest for a fallible record stream, stopping at the first error
    pub fn try_treeify<R, I>(&self, records: I) -> Result<Vec<Node<R, C>>>
    where
        R: Classify<Kind = K>,
        I: IntoIterator<Item = Result<R>>,
    {
        let mut roots: Vec<Node<R, C>> = Vec::new();
        let mut stack: Vec<OpenContainer<R, C>> = Vec::new();
        let mut position = 0;

        for record in records {
            let record = record?;
            let kind = record.kind();

            match self.action_for(kind) {
                Some(TreeifyAction::Push(container_kind)) => {
                    stack.push(OpenContainer {
                        kind: container_kind,
                        position,
                        opening: record,
                        fields: IndexMap::new(),
                    });
                }
                Some(TreeifyAction::Leaf(field)) => match stack.last_mut() {
                    Some(top) => top.attach(field, Node::Leaf(record)),
                    None => roots.push(Node::Leaf(record)),
                },
                Some(TreeifyAction::Pop(field)) => {
                    let Some(closed) = stack.pop() else {
                        return Err(self.hierarchy_error(
                            &record,
                            position,
                            0,
                            format!("{:?} closes a container but none is open", kind),
                        ));
                    };
                    let node = Node::Container(closed.close());
                    match stack.last_mut() {
                        Some(parent) => parent.attach(field, node),
                        None => roots.push(node),
                    }
                }
                None => roots.push(Node::Leaf(record)),
            }
            position += 1;
        }

        if let Some(open) = stack.last() {
            return Err(self.hierarchy_error(
                &open.opening,
                open.position,
                stack.len(),
                format!("unterminated {:?} container at end of input", open.kind),
            ));
        }

        Ok(roots)
    }

    /// Locate an error on `record`, falling back to its 1-based stream
    /// position and kind when it carries no source line
    fn hierarchy_error<R>(&self, record: &R, position: usize, depth: usize, reason: String) -> OdbError
    where
        R: Classify<Kind = K>,
    {
        let (line_number, line) = match record.source() {
            Some((line_number, line)) => (line_number, line.to_string()),
            None => (position + 1, format!("{:?}", record.kind())),
        };
        OdbError::Hierarchy {
            section: self.section.to_string(),
            line_number,
            line,
            depth,
            reason,
        }
    }
}

/// Build a forest from `records` with `rules`
pub fn treeify<R, C, I>(records: I, rules: &[TreeifyRule<R::Kind, C>]) -> Result<Vec<Node<R, C>>>
where
    R: Classify,
    C: Copy + fmt::Debug,
    I: IntoIterator<Item = R>,
{
    Treeifier::new(rules).treeify(records)
}
