//! Graph analysis — link validation, cycle checks, and ordering queries.
//!
//! Evaluation itself assumes an acyclic graph; the authoring surface calls
//! into these checks so a cycle can never be built through the public API.
//! External editors also use the ordering queries for display.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::EngineError;

use super::graph::Graph;
use super::socket::InputSource;

/// Validate a prospective link before the graph rewrites anything.
///
/// Checks, in order: source node and output socket exist, target node and
/// input socket exist, no self-connection, no cycle.
pub fn validate_link(
    graph: &Graph,
    from_node: &str,
    from_socket: &str,
    to_node: &str,
    to_socket: &str,
) -> Result<(), EngineError> {
    let source = graph
        .get_node(from_node)
        .ok_or_else(|| EngineError::UnknownNode(from_node.to_string()))?;
    source.output_index(from_socket)?;

    let target = graph
        .get_node(to_node)
        .ok_or_else(|| EngineError::UnknownNode(to_node.to_string()))?;
    if !target.inputs.iter().any(|i| i.name == to_socket) {
        return Err(EngineError::unknown_socket(to_node, to_socket));
    }

    if from_node == to_node {
        return Err(EngineError::InvalidConnection(format!(
            "cannot connect node '{from_node}' to itself"
        )));
    }

    if would_create_cycle(graph, from_node, to_node) {
        return Err(EngineError::InvalidConnection(format!(
            "link {from_node}.{from_socket} -> {to_node}.{to_socket} would create a cycle"
        )));
    }

    Ok(())
}

/// Check whether linking `from_node -> to_node` would create a cycle.
///
/// BFS from `to_node` along existing producer->consumer edges: if
/// `from_node` is already reachable, the new link closes a loop.
pub fn would_create_cycle(graph: &Graph, from_node: &str, to_node: &str) -> bool {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(to_node.to_string());

    while let Some(current) = queue.pop_front() {
        if current == from_node {
            return true;
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        for consumer in downstream_nodes(graph, &current) {
            queue.push_back(consumer);
        }
    }
    false
}

/// Names of nodes that consume any output of `name`.
pub fn downstream_nodes(graph: &Graph, name: &str) -> Vec<String> {
    graph
        .nodes
        .iter()
        .filter(|(_, node)| {
            node.inputs.iter().any(|input| {
                matches!(&input.source, Some(InputSource::Link(link)) if link.node == name)
            })
        })
        .map(|(consumer, _)| consumer.clone())
        .collect()
}

/// Names of nodes that feed any input of `name`.
pub fn upstream_nodes(graph: &Graph, name: &str) -> Vec<String> {
    let Some(node) = graph.get_node(name) else {
        return Vec::new();
    };
    let mut upstream = Vec::new();
    for input in &node.inputs {
        if let Some(InputSource::Link(link)) = &input.source {
            if !upstream.contains(&link.node) {
                upstream.push(link.node.clone());
            }
        }
    }
    upstream
}

/// Topological order over the whole graph (sources first, sinks last),
/// via Kahn's algorithm. Fails if the graph contains a cycle.
pub fn topological_order(graph: &Graph) -> Result<Vec<String>, EngineError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();

    for name in graph.nodes.keys() {
        in_degree.insert(name, 0);
        adj.insert(name, Vec::new());
    }

    for (consumer, node) in &graph.nodes {
        for input in &node.inputs {
            if let Some(InputSource::Link(link)) = &input.source {
                // Links to missing producers surface at resolution time,
                // not here.
                if let Some(edges) = adj.get_mut(link.node.as_str()) {
                    edges.push(consumer.as_str());
                    if let Some(degree) = in_degree.get_mut(consumer.as_str()) {
                        *degree += 1;
                    }
                }
            }
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut sorted = Vec::new();

    while let Some(name) = queue.pop_front() {
        sorted.push(name.to_string());
        if let Some(consumers) = adj.get(name) {
            for &consumer in consumers {
                if let Some(degree) = in_degree.get_mut(consumer) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(consumer);
                    }
                }
            }
        }
    }

    if sorted.len() != graph.nodes.len() {
        return Err(EngineError::InvalidConnection(
            "cycle detected in graph".to_string(),
        ));
    }

    Ok(sorted)
}
