//! Connectivity analysis over a dense adjacency view
//!
//! Works on `adjacency[v] = neighbours of v` with vertices numbered
//! `0..n`. The graph must be simple (no self loops, no parallel edges).
//! Both the global brick graph and the local scratch graphs feed through
//! these functions.

use std::collections::HashMap;

const NO_PARENT: usize = usize::MAX;
const UNVISITED: usize = usize::MAX;

/// Normalized undirected edge key
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Connected component labelling
#[derive(Clone, Debug, Default)]
pub struct ComponentLabels {
    /// Component id per vertex
    pub labels: Vec<usize>,
    /// Number of components (isolated vertices count as one each)
    pub count: usize,
}

/// Label connected components with an iterative depth-first search
pub fn connected_components(adjacency: &[Vec<usize>]) -> ComponentLabels {
    let n = adjacency.len();
    let mut labels = vec![UNVISITED; n];
    let mut count = 0;
    let mut stack = Vec::new();

    for root in 0..n {
        if labels[root] != UNVISITED {
            continue;
        }
        labels[root] = count;
        stack.push(root);
        while let Some(v) = stack.pop() {
            for &w in &adjacency[v] {
                if labels[w] == UNVISITED {
                    labels[w] = count;
                    stack.push(w);
                }
            }
        }
        count += 1;
    }

    ComponentLabels { labels, count }
}

/// Biconnected components and articulation points
#[derive(Clone, Debug, Default)]
pub struct Biconnectivity {
    /// Biconnected component id per edge, keyed by [`edge_key`]
    pub edge_components: HashMap<(usize, usize), usize>,
    /// Articulation flag per vertex
    pub articulation: Vec<bool>,
    /// Number of biconnected components (only edges form components)
    pub count: usize,
}

struct Frame {
    vertex: usize,
    parent: usize,
    next: usize,
}

/// Hopcroft-Tarjan biconnected components, iterative to survive tall models
pub fn biconnected_components(adjacency: &[Vec<usize>]) -> Biconnectivity {
    let n = adjacency.len();
    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut articulation = vec![false; n];
    let mut edge_components = HashMap::new();
    let mut edge_stack: Vec<(usize, usize)> = Vec::new();
    let mut time = 0usize;
    let mut count = 0usize;

    for root in 0..n {
        if disc[root] != UNVISITED {
            continue;
        }
        disc[root] = time;
        low[root] = time;
        time += 1;

        let mut root_children = 0;
        let mut stack = vec![Frame { vertex: root, parent: NO_PARENT, next: 0 }];

        while let Some(frame) = stack.last_mut() {
            let v = frame.vertex;
            if frame.next < adjacency[v].len() {
                let w = adjacency[v][frame.next];
                frame.next += 1;
                let parent = frame.parent;

                if disc[w] == UNVISITED {
                    edge_stack.push((v, w));
                    disc[w] = time;
                    low[w] = time;
                    time += 1;
                    if v == root {
                        root_children += 1;
                    }
                    stack.push(Frame { vertex: w, parent: v, next: 0 });
                } else if w != parent && disc[w] < disc[v] {
                    // Back edge to an ancestor
                    edge_stack.push((v, w));
                    low[v] = low[v].min(disc[w]);
                }
                continue;
            }

            stack.pop();
            let Some(parent_frame) = stack.last() else {
                continue;
            };
            let u = parent_frame.vertex;
            low[u] = low[u].min(low[v]);

            if low[v] >= disc[u] {
                if u != root {
                    articulation[u] = true;
                }
                while let Some((a, b)) = edge_stack.pop() {
                    edge_components.insert(edge_key(a, b), count);
                    if (a, b) == (u, v) {
                        break;
                    }
                }
                count += 1;
            }
        }

        if root_children > 1 {
            articulation[root] = true;
        }
    }

    Biconnectivity {
        edge_components,
        articulation,
        count,
    }
}

/// Articulation points whose removal leaves at least two non-trivial pieces.
///
/// A vertex is weak when two of its neighbours of degree > 1 hang off it
/// through edges of different biconnected components. Detaching a single
/// pendant brick does not count.
pub fn bad_articulation_points(adjacency: &[Vec<usize>], bicon: &Biconnectivity) -> Vec<bool> {
    let mut bad = vec![false; adjacency.len()];
    for (v, neighbours) in adjacency.iter().enumerate() {
        if !bicon.articulation[v] {
            continue;
        }
        let mut first_component = None;
        for &w in neighbours {
            if adjacency[w].len() <= 1 {
                continue;
            }
            let Some(&component) = bicon.edge_components.get(&edge_key(v, w)) else {
                continue;
            };
            match first_component {
                None => first_component = Some(component),
                Some(first) if first != component => {
                    bad[v] = true;
                    break;
                }
                Some(_) => {}
            }
        }
    }
    bad
}

/// Full analysis result for one graph snapshot
#[derive(Clone, Debug, Default)]
pub struct ConnectivityAnalysis {
    pub components: ComponentLabels,
    pub bicon: Biconnectivity,
    pub bad_articulation: Vec<bool>,
}

impl ConnectivityAnalysis {
    pub fn component_count(&self) -> usize {
        self.components.count
    }

    pub fn bicomponent_count(&self) -> usize {
        self.bicon.count
    }

    pub fn bad_articulation_count(&self) -> usize {
        self.bad_articulation.iter().filter(|b| **b).count()
    }
}

/// Run every analysis pass over the adjacency view
pub fn analyze(adjacency: &[Vec<usize>]) -> ConnectivityAnalysis {
    let components = connected_components(adjacency);
    let bicon = biconnected_components(adjacency);
    let bad_articulation = bad_articulation_points(adjacency, &bicon);
    ConnectivityAnalysis {
        components,
        bicon,
        bad_articulation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in edges {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        adjacency
    }

    #[test]
    fn test_components() {
        let g = graph(5, &[(0, 1), (1, 2), (3, 4)]);
        let labels = connected_components(&g);
        assert_eq!(labels.count, 2);
        assert_eq!(labels.labels[0], labels.labels[2]);
        assert_ne!(labels.labels[0], labels.labels[3]);
    }

    #[test]
    fn test_isolated_vertices_are_components() {
        let labels = connected_components(&graph(3, &[]));
        assert_eq!(labels.count, 3);
        assert_eq!(biconnected_components(&graph(3, &[])).count, 0);
    }

    #[test]
    fn test_chain() {
        // 0 - 1 - 2 - 3 - 4
        let g = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let bicon = biconnected_components(&g);
        assert_eq!(bicon.count, 4);
        assert_eq!(bicon.articulation, vec![false, true, true, true, false]);

        // Only the middle has two non-leaf neighbours on different blocks
        let bad = bad_articulation_points(&g, &bicon);
        assert_eq!(bad, vec![false, false, true, false, false]);
    }

    #[test]
    fn test_short_chain_has_no_weak_point() {
        let g = graph(3, &[(0, 1), (1, 2)]);
        let analysis = analyze(&g);
        assert!(analysis.bicon.articulation[1]);
        assert_eq!(analysis.bad_articulation_count(), 0);
    }

    #[test]
    fn test_cycle_is_one_block() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let bicon = biconnected_components(&g);
        assert_eq!(bicon.count, 1);
        assert!(bicon.articulation.iter().all(|a| !a));
    }

    #[test]
    fn test_bowtie() {
        // Two triangles sharing vertex 2
        let g = graph(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
        let analysis = analyze(&g);
        assert_eq!(analysis.bicomponent_count(), 2);
        assert_eq!(analysis.bicon.articulation, vec![false, false, true, false, false]);
        assert_eq!(analysis.bad_articulation, vec![false, false, true, false, false]);
        assert_eq!(
            analysis.bicon.edge_components[&edge_key(0, 1)],
            analysis.bicon.edge_components[&edge_key(2, 0)]
        );
        assert_ne!(
            analysis.bicon.edge_components[&edge_key(0, 1)],
            analysis.bicon.edge_components[&edge_key(3, 4)]
        );
    }

    #[test]
    fn test_root_articulation() {
        // Star centred on the DFS root
        let g = graph(4, &[(0, 1), (0, 2), (0, 3)]);
        let analysis = analyze(&g);
        assert!(analysis.bicon.articulation[0]);
        // All neighbours are leaves, nothing weak
        assert_eq!(analysis.bad_articulation_count(), 0);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let n = 100_000;
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let analysis = analyze(&graph(n, &edges));
        assert_eq!(analysis.component_count(), 1);
        assert_eq!(analysis.bicomponent_count(), n - 1);
    }
}
