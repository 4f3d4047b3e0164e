//! Argument strings for the built-in commands
//!
//! slicebot takes getopt-style flags. The client never interprets them; these
//! helpers only assemble the space-joined token list each command expects.

use std::fmt::Display;

/// Edge types to follow, passed as repeated `-e <edge>` flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    edges: Vec<String>,
}

impl EdgeFilter {
    /// Follow every edge type
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an edge type
    pub fn edge(mut self, edge: impl Into<String>) -> Self {
        self.edges.push(edge.into());
        self
    }

    /// Edge types in the order they will be sent
    pub fn edges(&self) -> &[String] {
        &self.edges
    }

    fn write_to(&self, args: &mut ArgList) {
        for edge in &self.edges {
            args.flag("-e", edge);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for EdgeFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            edges: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Options for [`Slicer::slice`](crate::Slicer::slice)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceOptions {
    /// Slice direction, passed as `-d`; slicebot's default when unset
    pub direction: Option<String>,
    /// Edge types to follow
    pub filter: EdgeFilter,
}

impl SliceOptions {
    /// Default direction, every edge type
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direction
    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    /// Set the edge filter
    pub fn with_filter(mut self, filter: EdgeFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn push(&mut self, token: impl Display) {
        self.0.push(token.to_string());
    }

    fn flag(&mut self, flag: &str, value: impl Display) {
        self.push(flag);
        self.push(value);
    }

    fn finish(self) -> String {
        self.0.join(" ")
    }
}

pub(crate) fn slice(prefix: &str, options: &SliceOptions) -> String {
    let mut args = ArgList::default();
    args.flag("-p", prefix);
    if let Some(direction) = &options.direction {
        args.flag("-d", direction);
    }
    options.filter.write_to(&mut args);
    args.finish()
}

pub(crate) fn node(id: impl Display) -> String {
    id.to_string()
}

pub(crate) fn edge(u: impl Display, v: impl Display) -> String {
    format!("{} {}", u, v)
}

pub(crate) fn sub_graph<I>(nodes: I, filter: &EdgeFilter) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let mut args = ArgList::default();
    filter.write_to(&mut args);
    for id in nodes {
        args.push(id);
    }
    args.finish()
}

pub(crate) fn partition(attr: &str, filter: &EdgeFilter) -> String {
    let mut args = ArgList::default();
    filter.write_to(&mut args);
    args.flag("-a", attr);
    args.finish()
}

pub(crate) fn projected_partition(prefix: &str, attr: &str, filter: &EdgeFilter) -> String {
    let mut args = ArgList::default();
    filter.write_to(&mut args);
    args.flag("-a", attr);
    args.flag("-p", prefix);
    args.finish()
}
