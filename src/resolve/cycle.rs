//! Cycle detection over unresolved moves.
//!
//! When the fixed-point loop stalls, the unresolved moves form a graph with
//! an edge from each move to the move of the unit standing in its
//! destination. Every node has at most one outgoing edge, so each weakly
//! connected component holds at most one cycle.

/// Finds every cycle in a graph where `next[i]` is the single successor of `i`.
///
/// Each cycle is returned once, rotated so that its smallest index comes
/// first. Cycles are ordered by that index.
pub fn find_cycles(next: &[Option<usize>]) -> Vec<Vec<usize>> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut mark = vec![UNSEEN; next.len()];
    let mut cycles = Vec::new();

    for start in 0..next.len() {
        if mark[start] != UNSEEN {
            continue;
        }
        let mut path = Vec::new();
        let mut cur = Some(start);
        while let Some(node) = cur {
            match mark[node] {
                UNSEEN => {
                    mark[node] = ON_PATH;
                    path.push(node);
                    cur = next[node];
                }
                ON_PATH => {
                    // `node` closes a cycle that starts where it sits on the path.
                    if let Some(pos) = path.iter().position(|&n| n == node) {
                        cycles.push(canonical(&path[pos..]));
                    }
                    break;
                }
                _ => break,
            }
        }
        for node in path {
            mark[node] = DONE;
        }
    }

    cycles.sort();
    cycles
}

fn canonical(cycle: &[usize]) -> Vec<usize> {
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, &n)| n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut out = cycle[min_pos..].to_vec();
    out.extend_from_slice(&cycle[..min_pos]);
    out
}
