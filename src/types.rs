//! Core identifiers for graph nodes and state channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `Start` and `End` are virtual endpoints: they are never registered or
/// executed, they only anchor edges. Every executable node is `Named`.
///
/// # Examples
///
/// ```
/// use threadloom::types::NodeId;
///
/// let agent = NodeId::from("agent");
/// assert_eq!(agent.encode(), "Named:agent");
/// assert_eq!(NodeId::decode("Named:agent"), agent);
/// assert_eq!(NodeId::decode("End"), NodeId::End);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// Virtual entry point; the first edge of every graph leaves from here.
    Start,
    /// Virtual terminal marker; reaching it completes the run.
    End,
    /// An executable node registered under a user-chosen name.
    Named(String),
}

impl NodeId {
    /// Encode into the persisted string form.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeId::Start => "Start".to_string(),
            NodeId::End => "End".to_string(),
            NodeId::Named(name) => format!("Named:{name}"),
        }
    }

    /// Decode a persisted string form. Unknown shapes fall back to `Named`
    /// so old checkpoints keep loading.
    #[must_use]
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeId::Start
        } else if s == "End" {
            NodeId::End
        } else if let Some(rest) = s.strip_prefix("Named:") {
            NodeId::Named(rest.to_string())
        } else {
            NodeId::Named(s.to_string())
        }
    }

    /// Returns `true` for the virtual terminal marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` for an executable node.
    #[must_use]
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

// Lets string literals stand in for node ids at graph-building call sites.
impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeId::Start,
            "End" => NodeId::End,
            other => NodeId::Named(other.to_string()),
        }
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId::from(s.as_str())
    }
}

/// Identifies a state channel, each with its own reducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// The conversation transcript (append / replace-by-id).
    Messages,
    /// Auxiliary key-value fields (last write wins).
    Extra,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Messages => write!(f, "messages"),
            Self::Extra => write!(f, "extra"),
        }
    }
}
