//! Random forest regression.
//!
//! Each tree is a CART regressor grown on a bootstrap sample of the training
//! set, splitting on the threshold that most reduces the squared error.
//! Every feature is considered at every split, so the randomness comes only
//! from the bootstrap. Trees are seeded from the forest seed plus their
//! index so a fit is reproducible.

use crate::error::{FieldWatchError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows each tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Running sums for the squared error of a set of targets.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: f64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn push(&mut self, y: f64) {
        self.count += 1.0;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn minus(&self, other: &Moments) -> Moments {
        Moments {
            count: self.count - other.count,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.sum / self.count
        }
    }

    /// Sum of squared deviations from the mean.
    fn sse(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            (self.sum_sq - self.sum * self.sum / self.count).max(0.0)
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A single CART regression tree stored as a flat node arena.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl RegressionTree {
    pub fn fit(x: &[Vec<f64>], y: &[f64], sample: &[usize], params: &ForestParams) -> Self {
        let width = x.first().map_or(0, Vec::len);
        let mut tree = Self {
            nodes: Vec::new(),
            importances: vec![0.0; width],
        };
        let mut indices = sample.to_vec();
        tree.grow(x, y, &mut indices, 0, params);

        let total: f64 = tree.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut tree.importances {
                *imp /= total;
            }
        }
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &mut [usize],
        depth: usize,
        params: &ForestParams,
    ) -> usize {
        let mut moments = Moments::default();
        for &i in indices.iter() {
            moments.push(y[i]);
        }

        let node_index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: moments.mean(),
        });

        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        let min_leaf = params.min_samples_leaf.max(1);
        if depth_reached || indices.len() < 2 * min_leaf || moments.sse() <= 0.0 {
            return node_index;
        }

        let Some(best) = best_split(x, y, indices, &moments, min_leaf) else {
            return node_index;
        };

        let mid = partition(indices, |i| x[i][best.feature] <= best.threshold);
        if mid == 0 || mid == indices.len() {
            return node_index;
        }

        self.importances[best.feature] += best.gain;
        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);
        self.nodes[node_index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_index
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
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
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Best squared-error reduction over every feature and threshold.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    parent: &Moments,
    min_leaf: usize,
) -> Option<BestSplit> {
    let width = x.get(indices[0]).map_or(0, Vec::len);
    let parent_sse = parent.sse();
    let mut best: Option<BestSplit> = None;
    let mut order = indices.to_vec();

    for feature in 0..width {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left = Moments::default();
        for pos in 0..order.len() - 1 {
            left.push(y[order[pos]]);
            let here = x[order[pos]][feature];
            let next = x[order[pos + 1]][feature];
            if here == next {
                continue;
            }
            let n_left = pos + 1;
            if n_left < min_leaf || order.len() - n_left < min_leaf {
                continue;
            }

            let right = parent.minus(&left);
            let gain = parent_sse - left.sse() - right.sse();
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit {
                    feature,
                    threshold: (here + next) / 2.0,
                    gain,
                });
            }
        }
    }

    best.filter(|b| b.gain > 0.0)
}

/// Reorders `indices` so that entries satisfying `pred` come first and
/// returns how many do.
fn partition(indices: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..indices.len() {
        if pred(indices[i]) {
            indices.swap(mid, i);
            mid += 1;
        }
    }
    mid
}

/// Bagged ensemble of [`RegressionTree`]s.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self> {
        if x.is_empty() {
            return Err(FieldWatchError::Training("no training rows".into()));
        }
        if x.len() != y.len() {
            return Err(FieldWatchError::Training(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(FieldWatchError::Training("forest needs at least one tree".into()));
        }

        let width = x[0].len();
        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_trees);
        for t in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit(x, y, &sample, params));
        }

        let mut importances = vec![0.0; width];
        for tree in &trees {
            for (total, imp) in importances.iter_mut().zip(&tree.importances) {
                *total += imp;
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            features = width,
            "Fitted random forest"
        );

        Ok(Self { trees, importances })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        total / self.trees.len() as f64
    }

    /// Mean impurity decrease per input column, summing to 1 unless no
    /// tree ever split.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(RegressionTree::node_count).sum()
    }
}

/// Coefficient of determination. A constant target scores 1.0 when matched
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}
