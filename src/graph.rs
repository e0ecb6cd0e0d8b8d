//! Upstream traversal of the material graph.

use std::collections::HashSet;

use crate::{
    dsl::{Connection, MaterialGraphDSL, Node, find_node, incoming_connections},
    error::{GenerationError, Result},
};

/// Collects `output_id` and every node feeding it, depth-first. Inputs are
/// visited before the node consuming them, so the output node comes last and
/// every node appears exactly once.
pub fn collect_upstream_nodes(graph: &MaterialGraphDSL, output_id: &str) -> Result<Vec<String>> {
    collect_upstream_nodes_filtered(graph, output_id, None, |_, _| true)
}

/// Like [`collect_upstream_nodes`], but only the given input slots of the
/// output node are followed. Nodes upstream of other slots are left out unless
/// they are also reachable through one of the listed slots.
pub fn collect_upstream_nodes_from_slots(
    graph: &MaterialGraphDSL,
    output_id: &str,
    slot_ids: &[String],
) -> Result<Vec<String>> {
    collect_upstream_nodes_filtered(graph, output_id, Some(slot_ids), |_, _| true)
}

/// Generic walk. `follow` decides, per consuming node and incoming connection,
/// whether the edge is traversed (used to cut unselected keyword branches).
pub fn collect_upstream_nodes_filtered<F>(
    graph: &MaterialGraphDSL,
    output_id: &str,
    slot_ids: Option<&[String]>,
    follow: F,
) -> Result<Vec<String>>
where
    F: Fn(&Node, &Connection) -> bool,
{
    let mut walker = Walker {
        graph,
        follow: &follow,
        visiting: HashSet::new(),
        visited: HashSet::new(),
        out: Vec::new(),
    };
    walker.visit(output_id, slot_ids)?;
    Ok(walker.out)
}

struct Walker<'g, 'f> {
    graph: &'g MaterialGraphDSL,
    follow: &'f dyn Fn(&Node, &Connection) -> bool,
    visiting: HashSet<String>,
    visited: HashSet<String>,
    out: Vec<String>,
}

impl Walker<'_, '_> {
    fn visit(&mut self, node_id: &str, slot_ids: Option<&[String]>) -> Result<()> {
        if self.visited.contains(node_id) {
            return Ok(());
        }
        if !self.visiting.insert(node_id.to_string()) {
            return Err(GenerationError::GraphCycle {
                node_id: node_id.to_string(),
            });
        }

        let node = find_node(self.graph, node_id)?;
        for conn in incoming_connections(self.graph, node) {
            if let Some(slots) = slot_ids {
                if !slots.iter().any(|s| *s == conn.to.port_id) {
                    continue;
                }
            }
            if !(self.follow)(node, conn) {
                continue;
            }
            self.visit(&conn.from.node_id, None)?;
        }

        self.visiting.remove(node_id);
        self.visited.insert(node_id.to_string());
        self.out.push(node_id.to_string());
        Ok(())
    }
}
