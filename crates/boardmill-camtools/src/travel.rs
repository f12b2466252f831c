//! Travel optimization between machining positions.
//!
//! Reordering the features cut by one tool to minimize rapid travel is the
//! Travelling Salesman Problem. Brute force is hopeless past a dozen holes,
//! so small groups get an exact dynamic programming solve and large groups
//! a nearest neighbour walk, which is better than 90% efficient in
//! practice.
//!
//! Routed strokes must enter at one end and leave at the other. They are
//! modelled as a pair of adjacent nodes joined by a zero cost edge, which
//! lets one solver handle drills and routes alike.

use std::collections::HashSet;

use boardmill_core::geometry::Coordinate;

/// Largest group solved exactly. The dynamic programming table is
/// `2^n * n` entries, so 16 nodes is about a megabyte and milliseconds.
pub const MAX_EXACT_NODES: usize = 16;

/// Order the given positions to minimize total travel, starting from the
/// first one.
///
/// `zero_edges` holds indexes `i` such that travelling from node `i` to
/// node `i + 1` is free (a routed stroke from entry to exit).
///
/// Returns the visiting order as a permutation of indexes.
pub fn optimize(coordinates: &[Coordinate], zero_edges: &HashSet<usize>) -> Vec<usize> {
    let n = coordinates.len();
    if n <= 1 {
        return (0..n).collect();
    }

    let matrix = distance_matrix(coordinates, zero_edges);

    if n <= MAX_EXACT_NODES {
        exact_path(&matrix)
    } else {
        nearest_neighbour(&matrix, zero_edges)
    }
}

fn distance_matrix(coordinates: &[Coordinate], zero_edges: &HashSet<usize>) -> Vec<Vec<f64>> {
    let n = coordinates.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let distance = if j == i + 1 && zero_edges.contains(&i) {
                0.0
            } else {
                coordinates[i].distance_to(&coordinates[j]).as_mm()
            };
            matrix[i][j] = distance;
            matrix[j][i] = distance;
        }
    }

    matrix
}

/// Exact open path from node 0 over all nodes, by Held-Karp dynamic
/// programming over subsets.
fn exact_path(matrix: &[Vec<f64>]) -> Vec<usize> {
    let n = matrix.len();
    // States are subsets of nodes 1..n, ending at a given node.
    let full = 1usize << (n - 1);
    let mut cost = vec![vec![f64::INFINITY; n - 1]; full];
    let mut parent = vec![vec![usize::MAX; n - 1]; full];

    for last in 0..(n - 1) {
        cost[1 << last][last] = matrix[0][last + 1];
    }

    for mask in 1..full {
        for last in 0..(n - 1) {
            if mask & (1 << last) == 0 || cost[mask][last].is_infinite() {
                continue;
            }
            let base = cost[mask][last];
            for next in 0..(n - 1) {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let next_mask = mask | (1 << next);
                let candidate = base + matrix[last + 1][next + 1];
                if candidate < cost[next_mask][next] {
                    cost[next_mask][next] = candidate;
                    parent[next_mask][next] = last;
                }
            }
        }
    }

    // Best endpoint of the complete path; no return leg to the start.
    let complete = full - 1;
    let mut last = (0..(n - 1))
        .min_by(|&a, &b| cost[complete][a].total_cmp(&cost[complete][b]))
        .unwrap_or(0);

    let mut order = Vec::with_capacity(n);
    let mut mask = complete;
    while last != usize::MAX {
        order.push(last + 1);
        let previous = parent[mask][last];
        mask &= !(1 << last);
        last = previous;
    }
    order.push(0);
    order.reverse();
    order
}

/// Greedy walk to the closest unvisited node, taking free edges first.
fn nearest_neighbour(matrix: &[Vec<f64>], zero_edges: &HashSet<usize>) -> Vec<usize> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        // A routed stroke exits at its paired node; take it immediately.
        if zero_edges.contains(&current) && current + 1 < n && !visited[current + 1] {
            current += 1;
            visited[current] = true;
            order.push(current);
            continue;
        }

        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by(|&a, &b| matrix[current][a].total_cmp(&matrix[current][b]));

        match next {
            Some(next) => {
                visited[next] = true;
                order.push(next);
                current = next;
            }
            None => break,
        }
    }

    order
}
