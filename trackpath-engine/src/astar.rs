//! The generic best-first search engine shared by every transport mode.
//!
//! One monomorphisation of this skeleton per mode (rail/road/ship/region/
//! river), sharing the open/closed-set machinery via [`trackpath_graph::node`]
//! generics, per the "variant nodes per mode" design note: a tagged sum over
//! node kinds was considered and rejected in favor of this, since only one
//! mode is ever active per query.

use trackpath_graph::node::{Node, NodeArena, NodeIndex, NodeKey};

/// Everything the engine needs to know about a particular search: how to
/// seed it, how to estimate remaining cost, how to recognize success, and
/// how to expand a node into its successors.
pub trait Problem {
    type Key: NodeKey;
    type Payload: Clone;

    /// Initial (possibly plural, for two-end-origin queries) open-set seeds:
    /// `(key, g, payload)`. `h` is computed separately via [`Problem::heuristic`].
    fn origins(&self) -> Vec<(Self::Key, i32, Self::Payload)>;

    fn heuristic(&self, key: &Self::Key) -> i32;

    fn is_destination(&self, key: &Self::Key, payload: &Self::Payload) -> bool;

    /// Successors of `key`, as `(key, new_g, payload, is_choice)`.
    /// `is_choice` is true iff this expansion produced 2 or more successors
    /// (used by the rail cost model to prune dead branches past a red
    /// two-way signal).
    fn successors(&self, key: &Self::Key, g: i32, payload: &Self::Payload) -> Vec<(Self::Key, i32, Self::Payload, bool)>;

    /// Reject any successor whose `g` exceeds this, if set.
    fn max_cost(&self) -> Option<i32> {
        None
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    DestinationFound,
    OpenSetExhausted,
    SearchNodeLimitReached,
}

/// Node-count telemetry, supplementing the pass/fail result with profiling
/// counters in the spirit of `yapf_node.hpp`'s `m_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub nodes_opened: u32,
    pub nodes_closed: u32,
}

/// Outcome of [`find_path`].
pub struct SearchResult<K: NodeKey, P> {
    pub termination: Termination,
    pub path_found: bool,
    /// Destination node if found, else the best intermediate node (minimum
    /// heuristic value seen, tie-broken by insertion order).
    pub best: NodeIndex,
    pub arena: NodeArena<K, P>,
    pub stats: SearchStats,
}

impl<K: NodeKey, P> SearchResult<K, P> {
    #[must_use]
    pub fn best_node(&self) -> &Node<K, P> {
        self.arena.get(self.best)
    }
}

fn closed_count_u32<K: NodeKey, P>(arena: &NodeArena<K, P>) -> u32 {
    u32::try_from(arena.closed_count()).unwrap_or(u32::MAX)
}

fn consider_intermediate<K: NodeKey, P>(
    arena: &NodeArena<K, P>,
    idx: NodeIndex,
    best: &mut Option<(NodeIndex, i32)>,
) {
    let node = arena.get(idx);
    let h = node.f - node.g;
    if best.is_none_or(|(_, best_h)| h < best_h) {
        *best = Some((idx, h));
    }
}

/// Runs the main A* loop against `problem`.
///
/// `max_search_nodes` is the closed-node budget; `0` means "no limit".
pub fn find_path<Pr: Problem>(problem: &Pr, max_search_nodes: u32) -> SearchResult<Pr::Key, Pr::Payload> {
    let mut arena: NodeArena<Pr::Key, Pr::Payload> = NodeArena::new();
    let mut nodes_opened: u32 = 0;
    let mut best_intermediate: Option<(NodeIndex, i32)> = None;

    for (key, g, payload) in problem.origins() {
        let h = problem.heuristic(&key);
        let idx = arena.insert_open(Node {
            key,
            parent: None,
            g,
            f: g + h,
            is_choice: false,
            payload,
        });
        nodes_opened += 1;
        consider_intermediate(&arena, idx, &mut best_intermediate);
    }

    loop {
        let Some(popped) = arena.pop_best_open() else {
            let best = best_intermediate
                .map(|(idx, _)| idx)
                .unwrap_or_else(|| unreachable!("at least one origin was seeded"));
            return SearchResult {
                termination: Termination::OpenSetExhausted,
                path_found: false,
                best,
                stats: SearchStats { nodes_opened, nodes_closed: closed_count_u32(&arena) },
                arena,
            };
        };

        let (key, g, payload, is_destination) = {
            let node = arena.get(popped);
            (node.key, node.g, node.payload.clone(), problem.is_destination(&node.key, &node.payload))
        };

        if is_destination {
            return SearchResult {
                termination: Termination::DestinationFound,
                path_found: true,
                best: popped,
                stats: SearchStats { nodes_opened, nodes_closed: closed_count_u32(&arena) },
                arena,
            };
        }

        if max_search_nodes != 0 && closed_count_u32(&arena) >= max_search_nodes {
            tracing::warn!(max_search_nodes, "search node budget exhausted");
            let best = best_intermediate.map_or(popped, |(idx, _)| idx);
            return SearchResult {
                termination: Termination::SearchNodeLimitReached,
                path_found: false,
                best,
                stats: SearchStats { nodes_opened, nodes_closed: closed_count_u32(&arena) },
                arena,
            };
        }

        for (succ_key, new_g, succ_payload, is_choice) in problem.successors(&key, g, &payload) {
            if let Some(max_cost) = problem.max_cost() {
                if new_g > max_cost {
                    continue;
                }
            }
            if arena.find_closed(&succ_key).is_some() {
                continue;
            }
            let h = problem.heuristic(&succ_key);
            let new_f = new_g + h;
            if let Some(open_idx) = arena.find_open(&succ_key) {
                if new_f < arena.get(open_idx).f {
                    arena.replace_open(
                        &succ_key,
                        Node { key: succ_key, parent: Some(popped), g: new_g, f: new_f, is_choice, payload: succ_payload },
                    );
                    let new_idx = arena.find_open(&succ_key).expect("just replaced");
                    consider_intermediate(&arena, new_idx, &mut best_intermediate);
                }
            } else {
                let idx = arena.insert_open(Node {
                    key: succ_key,
                    parent: Some(popped),
                    g: new_g,
                    f: new_f,
                    is_choice,
                    payload: succ_payload,
                });
                nodes_opened += 1;
                consider_intermediate(&arena, idx, &mut best_intermediate);
            }
        }

        arena.close(popped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A trivial line graph `0 -> 1 -> 2 -> ... -> N`, destination is `N`.
    struct LineProblem {
        len: u32,
    }

    impl Problem for LineProblem {
        type Key = u32;
        type Payload = ();

        fn origins(&self) -> Vec<(u32, i32, ())> {
            vec![(0, 0, ())]
        }

        fn heuristic(&self, key: &u32) -> i32 {
            i32::try_from(self.len - key).unwrap()
        }

        fn is_destination(&self, key: &u32, _payload: &()) -> bool {
            *key == self.len
        }

        fn successors(&self, key: &u32, g: i32, _payload: &()) -> Vec<(u32, i32, (), bool)> {
            if *key >= self.len {
                vec![]
            } else {
                vec![(key + 1, g + 1, (), false)]
            }
        }
    }

    #[test]
    fn finds_the_only_path() {
        let problem = LineProblem { len: 5 };
        let result = find_path(&problem, 0);
        assert!(result.path_found);
        assert_eq!(result.termination, Termination::DestinationFound);
        assert_eq!(result.best_node().g, 5);
    }

    #[test]
    fn respects_search_node_budget() {
        let problem = LineProblem { len: 100 };
        let result = find_path(&problem, 3);
        assert!(!result.path_found);
        assert_eq!(result.termination, Termination::SearchNodeLimitReached);
    }

    /// A graph with no route to the destination: open set empties out.
    struct DeadEndProblem;

    impl Problem for DeadEndProblem {
        type Key = u32;
        type Payload = ();

        fn origins(&self) -> Vec<(u32, i32, ())> {
            vec![(0, 0, ())]
        }

        fn heuristic(&self, _key: &u32) -> i32 {
            0
        }

        fn is_destination(&self, key: &u32, _payload: &()) -> bool {
            *key == 999
        }

        fn successors(&self, key: &u32, g: i32, _payload: &()) -> Vec<(u32, i32, (), bool)> {
            if *key == 0 {
                vec![(1, g + 1, (), false)]
            } else {
                vec![]
            }
        }
    }

    #[test]
    fn exhausted_open_set_returns_best_intermediate() {
        let result = find_path(&DeadEndProblem, 0);
        assert!(!result.path_found);
        assert_eq!(result.termination, Termination::OpenSetExhausted);
    }
}
