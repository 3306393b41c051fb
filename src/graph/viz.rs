//! DOT export and best-effort PNG rendering for compiled workflows.
//!
//! The DOT output can be rendered with Graphviz tools (`dot`, `neato`, etc.)
//! or pasted into an online viewer. PNG rendering shells out to `dot` and is
//! strictly best-effort: a missing binary or a failed render never disturbs
//! the caller.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Stdio;

use rustc_hash::FxHashMap;

use super::workflow::Workflow;
use crate::types::NodeId;

impl Workflow {
    /// Renders the workflow topology as Graphviz DOT text.
    ///
    /// Start and End get filled styling; direct edges are solid, conditional
    /// edges are dashed and carry their routing label.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut ids: Vec<NodeId> = vec![NodeId::Start];
        ids.extend(self.node_order().iter().cloned());
        ids.push(NodeId::End);

        let mut index: FxHashMap<&NodeId, usize> = FxHashMap::default();
        for (i, id) in ids.iter().enumerate() {
            index.insert(id, i);
        }

        let mut output = String::new();
        let _ = writeln!(output, "digraph {{");
        let _ = writeln!(output, "    rankdir=TB;");
        let _ = writeln!(output, "    node [shape=box, style=rounded];");

        for (i, id) in ids.iter().enumerate() {
            let style = match id {
                NodeId::Start => " style=\"filled\" fillcolor=\"lightgreen\"",
                NodeId::End => " style=\"filled\" fillcolor=\"lightcoral\"",
                NodeId::Named(_) => "",
            };
            let _ = writeln!(output, "    {i} [ label=\"{id}\"{style} ];");
        }

        let _ = writeln!(output);

        let mut direct: Vec<(&NodeId, &NodeId)> = self.edges().iter().collect();
        direct.sort_by_key(|(from, _)| index.get(from).copied());
        for (from, to) in direct {
            if let (Some(f), Some(t)) = (index.get(from), index.get(to)) {
                let _ = writeln!(output, "    {f} -> {t};");
            }
        }

        for edge in self.conditional_edges() {
            let Some(f) = index.get(edge.from()) else {
                continue;
            };
            for (label, to) in edge.targets() {
                if let Some(t) = index.get(to) {
                    let _ = writeln!(output, "    {f} -> {t} [ style=dashed label=\"{label}\" ];");
                }
            }
        }

        let _ = writeln!(output, "}}");
        output
    }

    /// Writes a PNG rendering of the workflow to `path` by piping the DOT
    /// text through the Graphviz `dot` binary.
    ///
    /// Best-effort by contract: any failure (no `dot` on PATH, render error,
    /// unwritable path) is logged at debug level and swallowed. Returns
    /// whether a PNG was produced.
    pub async fn write_visualization(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let dot_text = self.to_dot();

        let spawned = tokio::process::Command::new("dot")
            .arg("-Tpng")
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                tracing::debug!(error = %err, "graphviz dot not available; skipping render");
                return false;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            if let Err(err) = stdin.write_all(dot_text.as_bytes()).await {
                tracing::debug!(error = %err, "failed to feed dot; skipping render");
                let _ = child.kill().await;
                return false;
            }
        }

        match child.wait().await {
            Ok(status) if status.success() => {
                tracing::debug!(path = %path.display(), "wrote workflow visualization");
                true
            }
            Ok(status) => {
                tracing::debug!(%status, "dot exited non-zero; skipping render");
                false
            }
            Err(err) => {
                tracing::debug!(error = %err, "dot did not finish; skipping render");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::graph::GraphBuilder;
    use crate::model::ScriptedModel;
    use crate::node::GraphNode;
    use crate::state::StateSnapshot;
    use crate::types::NodeId;

    fn sample_workflow() -> crate::graph::Workflow {
        let model = Arc::new(ScriptedModel::replies(vec![]));
        GraphBuilder::new()
            .add_node("agent", GraphNode::model(model))
            .add_edge(NodeId::Start, "agent")
            .add_conditional_edge(
                "agent",
                |_: &StateSnapshot| "end".to_string(),
                [("end", NodeId::End)],
            )
            .compile()
            .unwrap()
    }

    #[test]
    fn dot_contains_nodes_and_labeled_edges() {
        let dot = sample_workflow().to_dot();
        assert!(dot.contains("digraph {"));
        assert!(dot.contains("label=\"Start\""));
        assert!(dot.contains("label=\"agent\""));
        assert!(dot.contains("label=\"End\""));
        assert!(dot.contains("style=dashed label=\"end\""));
    }

    #[test]
    fn dot_marks_start_and_end() {
        let dot = sample_workflow().to_dot();
        assert!(dot.contains("lightgreen"));
        assert!(dot.contains("lightcoral"));
    }

    // Fails whether graphviz is installed or not: either the spawn fails or
    // dot cannot write the output path. Must return false and not hang on an
    // unreaped child.
    #[tokio::test]
    async fn failed_render_returns_false_without_hanging() {
        let wrote = sample_workflow()
            .write_visualization("/nonexistent-dir/graph.png")
            .await;
        assert!(!wrote);
    }
}
