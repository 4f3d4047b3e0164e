//! Command and reply verbs
//!
//! The verb is the leading token of every protocol line. Commands sent to
//! slicebot use [`Verb`]; lines coming back start with a [`ReplyVerb`].

use crate::error::{ProtocolError, Result};
use crate::payload::Shape;
use std::fmt;

/// Command verb written at the start of a request line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Load a graph file
    Load,
    /// Look up labels matching a prefix
    Candidates,
    /// Slice the graph around matching nodes
    Slice,
    /// Fetch a single node
    Node,
    /// Fetch a single edge
    Edge,
    /// Induced subgraph over a node set
    Subgraph,
    /// Partition the graph by an attribute
    Partition,
    /// Partition restricted to nodes matching a prefix
    ProjectedPartition,
    /// Any other verb, passed through verbatim
    Custom(String),
}

impl Verb {
    /// Build a custom verb, rejecting anything that would break framing
    pub fn custom(verb: impl Into<String>) -> Result<Self> {
        let verb = verb.into();
        validate(&verb)?;
        Ok(Self::from(verb.as_str()))
    }

    /// The verb as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Self::Load => "LOAD",
            Self::Candidates => "CANDIDATES",
            Self::Slice => "SLICE",
            Self::Node => "NODE",
            Self::Edge => "EDGE",
            Self::Subgraph => "SUBGRAPH",
            Self::Partition => "PARTITION",
            Self::ProjectedPartition => "PROJECTED-PARTITION",
            Self::Custom(verb) => verb,
        }
    }

    /// Reply verb slicebot sends back on success
    pub fn expected_reply(&self) -> ReplyVerb {
        match self {
            Self::Load => ReplyVerb::Ok,
            Self::Candidates => ReplyVerb::Candidates,
            Self::Slice | Self::Partition | Self::ProjectedPartition => ReplyVerb::Graphs,
            Self::Node => ReplyVerb::Node,
            Self::Edge => ReplyVerb::Edge,
            Self::Subgraph => ReplyVerb::Graph,
            Self::Custom(_) => ReplyVerb::Ok,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate(self.as_str())
    }
}

fn validate(verb: &str) -> Result<()> {
    if verb.is_empty()
        || verb
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ProtocolError::InvalidVerb(verb.to_string()));
    }
    Ok(())
}

impl From<&str> for Verb {
    fn from(verb: &str) -> Self {
        match verb {
            "LOAD" => Self::Load,
            "CANDIDATES" => Self::Candidates,
            "SLICE" => Self::Slice,
            "NODE" => Self::Node,
            "EDGE" => Self::Edge,
            "SUBGRAPH" => Self::Subgraph,
            "PARTITION" => Self::Partition,
            "PROJECTED-PARTITION" => Self::ProjectedPartition,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verb at the start of a reply line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReplyVerb {
    /// Plain success
    Ok,
    /// Candidate rows
    Candidates,
    /// Serialized forest (slice and partition results)
    Graphs,
    /// Serialized single graph (subgraph results)
    Graph,
    /// Node record
    Node,
    /// Edge record
    Edge,
    /// Remote failure; the payload is the message
    Error,
    /// Anything slicebot is not known to send
    Other(String),
}

impl ReplyVerb {
    /// Parse the verb token of a reply line
    pub fn parse(verb: &str) -> Self {
        match verb {
            "OK" => Self::Ok,
            "CANDIDATES" => Self::Candidates,
            "GRAPHS" => Self::Graphs,
            "GRAPH" => Self::Graph,
            "NODE" => Self::Node,
            "EDGE" => Self::Edge,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// The verb as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Candidates => "CANDIDATES",
            Self::Graphs => "GRAPHS",
            Self::Graph => "GRAPH",
            Self::Node => "NODE",
            Self::Edge => "EDGE",
            Self::Error => "ERROR",
            Self::Other(verb) => verb,
        }
    }

    /// How a success payload carried by this verb is decoded
    ///
    /// `ERROR` and unknown verbs have no success shape.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Ok => Some(Shape::Ack),
            Self::Candidates => Some(Shape::Candidates),
            Self::Graphs | Self::Graph => Some(Shape::Text),
            Self::Node | Self::Edge => Some(Shape::Record),
            Self::Error | Self::Other(_) => None,
        }
    }
}

impl fmt::Display for ReplyVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Verb::Load, ReplyVerb::Ok)]
    #[case(Verb::Candidates, ReplyVerb::Candidates)]
    #[case(Verb::Slice, ReplyVerb::Graphs)]
    #[case(Verb::Node, ReplyVerb::Node)]
    #[case(Verb::Edge, ReplyVerb::Edge)]
    #[case(Verb::Subgraph, ReplyVerb::Graph)]
    #[case(Verb::Partition, ReplyVerb::Graphs)]
    #[case(Verb::ProjectedPartition, ReplyVerb::Graphs)]
    #[case(Verb::Custom("STATS".to_string()), ReplyVerb::Ok)]
    fn test_expected_reply_table(#[case] verb: Verb, #[case] reply: ReplyVerb) {
        assert_eq!(verb.expected_reply(), reply);
        assert!(reply.shape().is_some());
    }

    #[test]
    fn test_verb_wire_names_round_trip() {
        for verb in [
            Verb::Load,
            Verb::Candidates,
            Verb::Slice,
            Verb::Node,
            Verb::Edge,
            Verb::Subgraph,
            Verb::Partition,
            Verb::ProjectedPartition,
        ] {
            assert_eq!(Verb::from(verb.as_str()), verb);
        }
        assert_eq!(Verb::from("load"), Verb::Custom("load".to_string()));
    }

    #[rstest]
    #[case("")]
    #[case("TWO WORDS")]
    #[case("LINE\nBREAK")]
    #[case("TAB\t")]
    fn test_custom_verb_rejects_framing_characters(#[case] verb: &str) {
        assert!(matches!(
            Verb::custom(verb),
            Err(ProtocolError::InvalidVerb(_))
        ));
    }

    #[test]
    fn test_custom_verb_maps_known_names() {
        assert_eq!(Verb::custom("NODE").unwrap(), Verb::Node);
        assert_eq!(
            Verb::custom("STATS").unwrap(),
            Verb::Custom("STATS".to_string())
        );
    }

    #[test]
    fn test_reply_verb_parse() {
        assert_eq!(ReplyVerb::parse("ERROR"), ReplyVerb::Error);
        assert_eq!(ReplyVerb::parse("GRAPHS"), ReplyVerb::Graphs);
        assert_eq!(
            ReplyVerb::parse("HELLO"),
            ReplyVerb::Other("HELLO".to_string())
        );
        assert!(ReplyVerb::Error.shape().is_none());
        assert!(ReplyVerb::parse("HELLO").shape().is_none());
    }
}
