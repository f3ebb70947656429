//! Best-first regression tree grown on gradient statistics.
//!
//! Each sample carries a gradient `g` and hessian `h`. A leaf predicts
//! `-G / (H + lambda)` and a split scores
//! `G_L^2/(H_L+lambda) + G_R^2/(H_R+lambda) - G^2/(H+lambda)`.
//! With `g = -y`, `h = 1` and `lambda = 0` this is plain variance
//! reduction and leaves hold the mean label, which for 0/1 labels is the
//! Gini split criterion and the class-1 frequency.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Depth limit; the root is depth 0. `None` is unlimited.
    pub max_depth: Option<usize>,
    /// Leaf limit for leaf-wise growth. `None` is unlimited.
    pub max_leaves: Option<usize>,
    pub min_samples_leaf: usize,
    /// Minimum hessian sum per child.
    pub min_child_weight: f64,
    /// Features sampled per split. `None` considers all.
    pub max_features: Option<usize>,
    /// L2 regularisation on leaf values.
    pub lambda: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_leaves: None,
            min_samples_leaf: 1,
            min_child_weight: 0.0,
            max_features: None,
            lambda: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                    // NaN goes right
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Frontier {
    node: usize,
    depth: usize,
    samples: Vec<usize>,
    split: Candidate,
}

/// Grows a tree over `samples` (indices into `x`, repeats allowed).
///
/// The leaf with the largest gain is split first until no split improves
/// the objective or a depth or leaf limit is reached.
#[must_use]
pub fn grow(
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    samples: &[usize],
    params: &GrowthParams,
    rng: &mut ChaCha8Rng,
) -> Tree {
    let stats = Stats { x, grad, hess, params };
    let mut nodes = vec![Node::Leaf {
        value: stats.leaf_value(samples),
    }];
    let mut frontier: Vec<Frontier> = Vec::new();
    stats.enqueue(&mut frontier, 0, 0, samples.to_vec(), rng);

    let mut leaves = 1;
    while params.max_leaves.map_or(true, |max| leaves < max) {
        let Some(best) = frontier
            .iter()
            .enumerate()
            .fold(None::<(usize, f64)>, |best, (i, f)| match best {
                Some((_, gain)) if gain >= f.split.gain => best,
                _ => Some((i, f.split.gain)),
            })
            .map(|(i, _)| i)
        else {
            break;
        };
        let Frontier {
            node,
            depth,
            samples,
            split,
        } = frontier.remove(best);

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&s| x[s][split.feature] <= split.threshold);

        let left = nodes.len();
        let right = left + 1;
        nodes.push(Node::Leaf {
            value: stats.leaf_value(&left_samples),
        });
        nodes.push(Node::Leaf {
            value: stats.leaf_value(&right_samples),
        });
        nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        leaves += 1;

        stats.enqueue(&mut frontier, left, depth + 1, left_samples, rng);
        stats.enqueue(&mut frontier, right, depth + 1, right_samples, rng);
    }

    Tree { nodes }
}

struct Stats<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a GrowthParams,
}

impl Stats<'_> {
    fn sums(&self, samples: &[usize]) -> (f64, f64) {
        samples
            .iter()
            .fold((0.0, 0.0), |(g, h), &s| (g + self.grad[s], h + self.hess[s]))
    }

    fn leaf_value(&self, samples: &[usize]) -> f64 {
        let (g, h) = self.sums(samples);
        let denom = h + self.params.lambda;
        if denom > 0.0 {
            -g / denom
        } else {
            0.0
        }
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        let denom = h + self.params.lambda;
        if denom > 0.0 {
            g * g / denom
        } else {
            0.0
        }
    }

    fn enqueue(
        &self,
        frontier: &mut Vec<Frontier>,
        node: usize,
        depth: usize,
        samples: Vec<usize>,
        rng: &mut ChaCha8Rng,
    ) {
        if self.params.max_depth.is_some_and(|max| depth >= max)
            || samples.len() < 2 * self.params.min_samples_leaf.max(1)
        {
            return;
        }
        if let Some(split) = self.best_split(&samples, rng) {
            frontier.push(Frontier {
                node,
                depth,
                samples,
                split,
            });
        }
    }

    fn best_split(&self, samples: &[usize], rng: &mut ChaCha8Rng) -> Option<Candidate> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let mut features: Vec<usize> = (0..n_features).collect();
        if let Some(k) = self.params.max_features {
            if k < n_features {
                features.shuffle(rng);
                features.truncate(k.max(1));
            }
        }

        let (g_total, h_total) = self.sums(samples);
        let parent = self.score(g_total, h_total);
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<Candidate> = None;
        let mut order = samples.to_vec();
        for feature in features {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for i in 0..order.len() - 1 {
                g_left += self.grad[order[i]];
                h_left += self.hess[order[i]];

                let here = self.x[order[i]][feature];
                let next = self.x[order[i + 1]][feature];
                if here == next {
                    continue;
                }
                let n_left = i + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }
                let h_right = h_total - h_left;
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                    continue;
                }

                let gain = self.score(g_left, h_left) + self.score(g_total - g_left, h_right) - parent;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mid = 0.5 * (here + next);
                    best = Some(Candidate {
                        feature,
                        threshold: if mid < next { mid } else { here },
                        gain,
                    });
                }
            }
        }
        best
    }
}
