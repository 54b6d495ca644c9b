use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Ceilings for one breadth-first search. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Budget {
    pub max_visited: Option<usize>,
    pub max_expanded: Option<usize>,
}

impl Budget {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Search {
    /// Edge labels from the start to the goal.
    Found(Vec<usize>),
    /// Every reachable state was expanded without meeting the goal.
    Exhausted { visited: usize },
    /// A ceiling was hit first.
    LimitReached { visited: usize, expanded: usize },
}

/// Back-pointer into the trail; the root has no parent.
#[derive(Debug, Clone, Copy)]
struct Step {
    parent: Option<usize>,
    edge: usize,
}

/// Breadth-first search over states reachable through `edges` labelled moves.
///
/// `next(state, edge)` returns the successor, or `None` to prune it. Edges are
/// tried in ascending order and each state is queued only the first time it is
/// seen, so the first goal dequeued has minimum depth and ties resolve towards
/// the lowest edge labels.
pub(crate) fn breadth_first<S, F>(
    start: S,
    goal: &S,
    edges: usize,
    budget: Budget,
    mut next: F,
) -> Search
where
    S: Clone + Eq + Hash,
    F: FnMut(&S, usize) -> Option<S>,
{
    let mut trail = vec![Step {
        parent: None,
        edge: 0,
    }];
    let mut visited = HashSet::new();
    visited.insert(start.clone());

    let mut queue = VecDeque::new();
    queue.push_back((start, 0usize));

    let mut expanded = 0usize;

    while let Some((state, node)) = queue.pop_front() {
        if &state == goal {
            return Search::Found(unwind(&trail, node));
        }

        expanded += 1;
        if budget.max_expanded.is_some_and(|max| expanded > max) {
            return Search::LimitReached {
                visited: visited.len(),
                expanded,
            };
        }

        for edge in 0..edges {
            let Some(child) = next(&state, edge) else {
                continue;
            };
            if visited.contains(&child) {
                continue;
            }
            if budget.max_visited.is_some_and(|max| visited.len() >= max) {
                return Search::LimitReached {
                    visited: visited.len(),
                    expanded,
                };
            }

            visited.insert(child.clone());
            trail.push(Step {
                parent: Some(node),
                edge,
            });
            queue.push_back((child, trail.len() - 1));
        }
    }

    Search::Exhausted {
        visited: visited.len(),
    }
}

fn unwind(trail: &[Step], mut node: usize) -> Vec<usize> {
    let mut path = Vec::new();
    while let Some(parent) = trail[node].parent {
        path.push(trail[node].edge);
        node = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walks a number line with steps of +1 and +3, capped at `cap`.
    fn walk(goal: u32, cap: u32, budget: Budget) -> Search {
        breadth_first(0u32, &goal, 2, budget, |&n, edge| {
            let next = n + if edge == 0 { 1 } else { 3 };
            (next <= cap).then_some(next)
        })
    }

    #[test]
    fn finds_shortest_path() {
        assert_eq!(walk(7, 10, Budget::unbounded()), Search::Found(vec![0, 1, 1]));
    }

    #[test]
    fn start_is_goal() {
        assert_eq!(walk(0, 10, Budget::unbounded()), Search::Found(vec![]));
    }

    #[test]
    fn pruned_goal_is_exhausted() {
        assert_eq!(
            walk(12, 10, Budget::unbounded()),
            Search::Exhausted { visited: 11 }
        );
    }

    #[test]
    fn visited_ceiling() {
        let budget = Budget {
            max_visited: Some(3),
            max_expanded: None,
        };
        assert!(matches!(
            walk(9, 10, budget),
            Search::LimitReached { visited: 3, .. }
        ));
    }

    #[test]
    fn expanded_ceiling() {
        let budget = Budget {
            max_visited: None,
            max_expanded: Some(2),
        };
        assert!(matches!(
            walk(9, 10, budget),
            Search::LimitReached { expanded: 3, .. }
        ));
    }
}
