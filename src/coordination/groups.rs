// Group builder — connected components over coordinated pairs.
//
// Each pair is an undirected edge between two authors. Components are found
// with a breadth-first traversal seeded from authors in the order they first
// appear in the pair list; components below the minimum size are dropped.
// A group's score is the mean of the direct pairs inside it. Authors joined
// only transitively add no score of their own.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::models::{CoordinatedGroup, CoordinatedPair};

/// Build coordination groups from the full set of coordinated pairs.
///
/// Group IDs follow discovery order; the returned list is stably sorted by
/// score descending, so equal scores keep discovery order.
pub fn build_groups(pairs: &[CoordinatedPair], min_group_size: usize) -> Vec<CoordinatedGroup> {
    if pairs.is_empty() {
        return Vec::new();
    }

    let graph = AuthorGraph::from_pairs(pairs);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for &start in &graph.order {
        if visited.contains(start) {
            continue;
        }

        let component = graph.component_from(start, &mut visited);
        if component.len() < min_group_size {
            continue;
        }

        let mut scores = Vec::new();
        let mut narrative_ids: BTreeSet<&str> = BTreeSet::new();
        for (i, a1) in component.iter().enumerate() {
            for a2 in &component[i + 1..] {
                if let Some(pair) = graph.pair(a1, a2) {
                    scores.push(pair.score);
                    narrative_ids.insert(pair.narrative_id.as_str());
                }
            }
        }

        let score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        groups.push(CoordinatedGroup {
            id: format!("coord_group_{:04}", groups.len()),
            evidence_summary: format!(
                "Group of {} authors with avg coordination score {:.2}",
                component.len(),
                score
            ),
            size: component.len(),
            author_ids: component.into_iter().map(str::to_string).collect(),
            score,
            narrative_ids: narrative_ids.into_iter().map(str::to_string).collect(),
        });
    }

    groups.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    groups
}

/// Adjacency lists plus a lookup from canonical author pair to its pair record.
struct AuthorGraph<'a> {
    /// Authors in first-appearance order
    order: Vec<&'a str>,
    neighbors: HashMap<&'a str, Vec<&'a str>>,
    /// Keyed by (smaller, larger) author ID. A pair seen in several
    /// narratives keeps the last record.
    pairs: HashMap<(&'a str, &'a str), &'a CoordinatedPair>,
}

impl<'a> AuthorGraph<'a> {
    fn from_pairs(pairs: &'a [CoordinatedPair]) -> Self {
        let mut graph = AuthorGraph {
            order: Vec::new(),
            neighbors: HashMap::new(),
            pairs: HashMap::new(),
        };

        for pair in pairs {
            let a = pair.author1_id.as_str();
            let b = pair.author2_id.as_str();
            graph.add_edge(a, b);
            graph.add_edge(b, a);
            graph.pairs.insert(canonical(a, b), pair);
        }

        graph
    }

    fn add_edge(&mut self, from: &'a str, to: &'a str) {
        if !self.neighbors.contains_key(from) {
            self.order.push(from);
        }
        let list = self.neighbors.entry(from).or_default();
        if !list.contains(&to) {
            list.push(to);
        }
    }

    fn pair(&self, a: &str, b: &str) -> Option<&'a CoordinatedPair> {
        self.pairs.get(&canonical(a, b)).copied()
    }

    /// Breadth-first traversal; returns authors in discovery order.
    fn component_from(&self, start: &'a str, visited: &mut HashSet<&'a str>) -> Vec<&'a str> {
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);

        while let Some(author) = queue.pop_front() {
            component.push(author);
            for &next in self.neighbors.get(author).into_iter().flatten() {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        component
    }
}

fn canonical<'s>(a: &'s str, b: &'s str) -> (&'s str, &'s str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
