//! Circular import detection

use std::collections::{btree_set, BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use codesense_sensors::{ComputationalIssue, IssueContext, IssueType, Severity};
use tracing::debug;

use crate::graph::DependencyGraph;

/// Tag attached to every cycle issue
pub const CIRCULAR_DEPENDENCY_TAG: &str = "circular-dependency";

const CYCLE_CONFIDENCE: f64 = 0.95;

/// Finds import cycles among tracked files
#[derive(Debug, Clone)]
pub struct CycleDetector {
    detected_by: String,
}

impl CycleDetector {
    pub fn new(detected_by: impl Into<String>) -> Self {
        Self {
            detected_by: detected_by.into(),
        }
    }

    /// Cycles in `adjacency`, each as the file sequence along the back edge.
    ///
    /// Nodes are visited in sorted order and cycles with the same member set
    /// are reported once. Every file inside a strongly connected component
    /// appears in at least one reported cycle, so the set of cyclic files does
    /// not depend on how files are named.
    pub fn find_cycles(&self, adjacency: &BTreeMap<PathBuf, BTreeSet<PathBuf>>) -> Vec<Vec<PathBuf>> {
        let mut visited: HashSet<&PathBuf> = HashSet::new();
        let mut seen: HashSet<BTreeSet<&PathBuf>> = HashSet::new();
        let mut cycles: Vec<Vec<&PathBuf>> = Vec::new();

        for root in adjacency.keys() {
            if visited.contains(root) {
                continue;
            }

            // iterative DFS: (node, neighbours), plus the recursion stack
            // as a path with each member's position
            let mut frames: Vec<(&PathBuf, btree_set::Iter<'_, PathBuf>)> = Vec::new();
            let mut path: Vec<&PathBuf> = Vec::new();
            let mut on_path: HashMap<&PathBuf, usize> = HashMap::new();

            visited.insert(root);
            on_path.insert(root, 0);
            path.push(root);
            frames.push((root, neighbours(adjacency, root)));

            loop {
                let step = match frames.last_mut() {
                    Some((_, iter)) => iter.next(),
                    None => break,
                };
                match step {
                    Some(next) => {
                        if let Some(&start) = on_path.get(next) {
                            let cycle = path[start..].to_vec();
                            if seen.insert(cycle.iter().copied().collect()) {
                                cycles.push(cycle);
                            }
                        } else if visited.insert(next) {
                            on_path.insert(next, path.len());
                            path.push(next);
                            frames.push((next, neighbours(adjacency, next)));
                        }
                    }
                    None => {
                        if let Some((done, _)) = frames.pop() {
                            on_path.remove(done);
                            path.pop();
                        }
                    }
                }
            }
        }

        // back edges miss files only reachable through finished nodes;
        // close the gap with a shortest cycle through each uncovered member
        let mut covered: HashSet<&PathBuf> = cycles.iter().flatten().copied().collect();
        for component in strongly_connected(adjacency) {
            if component.len() < 2 {
                continue;
            }
            let members: HashSet<&PathBuf> = component.iter().copied().collect();
            for &member in &component {
                if covered.contains(member) {
                    continue;
                }
                if let Some(cycle) = shortest_cycle_through(adjacency, member, &members) {
                    covered.extend(cycle.iter().copied());
                    if seen.insert(cycle.iter().copied().collect()) {
                        cycles.push(cycle);
                    }
                }
            }
        }

        cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().cloned().collect())
            .collect()
    }

    /// One issue per distinct cycle in `graph`
    pub fn detect(&self, graph: &DependencyGraph) -> Vec<ComputationalIssue> {
        let cycles = self.find_cycles(&graph.adjacency());
        if !cycles.is_empty() {
            debug!("Found {} import cycles", cycles.len());
        }
        cycles.iter().map(|cycle| self.issue_for(cycle)).collect()
    }

    fn issue_for(&self, cycle: &[PathBuf]) -> ComputationalIssue {
        let files: Vec<String> = cycle
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();

        let mut chain = files.clone();
        if let Some(first) = files.first() {
            chain.push(first.clone());
        }

        let severity = if files.len() <= 2 {
            Severity::High
        } else {
            Severity::Critical
        };

        let file = files.first().cloned().unwrap_or_default();
        ComputationalIssue::new(
            IssueType::ArchitecturalInconsistency,
            severity,
            format!("Circular dependency: {}", chain.join(" -> ")),
            IssueContext::file(file).with_related_files(files),
            self.detected_by.clone(),
        )
        .with_confidence(CYCLE_CONFIDENCE)
        .with_tag(CIRCULAR_DEPENDENCY_TAG)
        .with_suggested_fix(
            "Move the shared code into a separate module or invert one of the imports",
        )
    }
}

fn neighbours<'a>(
    adjacency: &'a BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    node: &PathBuf,
) -> btree_set::Iter<'a, PathBuf> {
    static EMPTY: BTreeSet<PathBuf> = BTreeSet::new();
    adjacency.get(node).unwrap_or(&EMPTY).iter()
}

/// Tarjan's strongly connected components, members in sorted order
fn strongly_connected(adjacency: &BTreeMap<PathBuf, BTreeSet<PathBuf>>) -> Vec<Vec<&PathBuf>> {
    let mut index: HashMap<&PathBuf, usize> = HashMap::new();
    let mut low: HashMap<&PathBuf, usize> = HashMap::new();
    let mut stack: Vec<&PathBuf> = Vec::new();
    let mut on_stack: HashSet<&PathBuf> = HashSet::new();
    let mut components = Vec::new();

    for root in adjacency.keys() {
        if index.contains_key(root) {
            continue;
        }

        let mut frames: Vec<(&PathBuf, btree_set::Iter<'_, PathBuf>)> = Vec::new();
        let order = index.len();
        index.insert(root, order);
        low.insert(root, order);
        stack.push(root);
        on_stack.insert(root);
        frames.push((root, neighbours(adjacency, root)));

        loop {
            let (node, step) = match frames.last_mut() {
                Some((node, iter)) => (*node, iter.next()),
                None => break,
            };
            match step {
                Some(next) if !index.contains_key(next) => {
                    let order = index.len();
                    index.insert(next, order);
                    low.insert(next, order);
                    stack.push(next);
                    on_stack.insert(next);
                    frames.push((next, neighbours(adjacency, next)));
                }
                Some(next) => {
                    if on_stack.contains(next) {
                        let reach = low[node].min(index[next]);
                        low.insert(node, reach);
                    }
                }
                None => {
                    frames.pop();
                    if let Some((parent, _)) = frames.last() {
                        let reach = low[*parent].min(low[node]);
                        low.insert(*parent, reach);
                    }
                    if low[node] == index[node] {
                        let mut component = Vec::new();
                        while let Some(member) = stack.pop() {
                            on_stack.remove(member);
                            component.push(member);
                            if member == node {
                                break;
                            }
                        }
                        component.sort();
                        components.push(component);
                    }
                }
            }
        }
    }

    components.sort();
    components
}

/// Shortest cycle from `start` back to itself inside `members`, starting at `start`
fn shortest_cycle_through<'a>(
    adjacency: &'a BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    start: &'a PathBuf,
    members: &HashSet<&PathBuf>,
) -> Option<Vec<&'a PathBuf>> {
    let mut parent: HashMap<&PathBuf, &PathBuf> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for next in neighbours(adjacency, node) {
            if !members.contains(next) {
                continue;
            }
            if next == start {
                let mut cycle = vec![node];
                let mut current = node;
                while current != start {
                    current = parent[current];
                    cycle.push(current);
                }
                cycle.reverse();
                return Some(cycle);
            }
            if !parent.contains_key(next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}
