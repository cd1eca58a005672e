//! Random forest of Gini-impurity classification trees.

use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split (sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Tree `i` draws from a generator seeded with `seed + i`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy)]
struct TreeParams {
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
    n_classes: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    weighted_impurity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
    importances: Vec<f64>,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    params: TreeParams,
    rng: &'a mut ChaCha8Rng,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn build(&mut self, indices: &[usize], depth: usize) -> Node {
        let n = indices.len();
        let counts = class_counts(self.y, indices, self.params.n_classes);
        let impurity = gini(&counts, n);

        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= 0.0
        {
            return leaf(&counts, n);
        }

        let split = match self.best_split(indices, impurity) {
            Some(split) => split,
            None => return leaf(&counts, n),
        };

        self.importances[split.feature] += n as f64 * (impurity - split.weighted_impurity);

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(&left, depth + 1)),
            right: Box::new(self.build(&right, depth + 1)),
        }
    }

    /// Tries a random subset of `max_features` features, continuing past it
    /// only while no impurity-reducing split has been found.
    fn best_split(&mut self, indices: &[usize], impurity: f64) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut *self.rng);

        let mut best: Option<SplitCandidate> = None;
        for (tried, &feature) in features.iter().enumerate() {
            if tried >= self.params.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(feature, indices) {
                let improves = candidate.weighted_impurity < impurity - 1e-12;
                let better = best
                    .map(|b| candidate.weighted_impurity < b.weighted_impurity)
                    .unwrap_or(true);
                if improves && better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_split_on(&self, feature: usize, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let n_classes = self.params.n_classes;
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut sorted: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (self.x[[i, feature]], self.y[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut right_counts = vec![0usize; n_classes];
        for &(_, class) in &sorted {
            right_counts[class] += 1;
        }
        let mut left_counts = vec![0usize; n_classes];

        let mut best: Option<SplitCandidate> = None;
        for pos in 0..n.saturating_sub(1) {
            let (value, class) = sorted[pos];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next_value = sorted[pos + 1].0;
            if value >= next_value {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let weighted = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;

            if best.map(|b| weighted < b.weighted_impurity).unwrap_or(true) {
                let midpoint = value + (next_value - value) / 2.0;
                let threshold = if midpoint < next_value { midpoint } else { value };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    weighted_impurity: weighted,
                });
            }
        }
        best
    }
}

impl DecisionTree {
    fn fit(
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        params: TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            params,
            rng,
            importances: vec![0.0; x.ncols()],
        };
        let root = builder.build(indices, 0);
        let importances = normalize(builder.importances);
        Self { root, importances }
    }

    /// Class distribution of the leaf the sample falls into.
    pub fn predict_proba(&self, sample: ArrayView1<f64>) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { left.as_ref() } else { right.as_ref() };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        depth_of(&self.root)
    }
}

/// Bagged ensemble with soft voting over leaf class distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// `y` holds class indices below `n_classes`, aligned with the rows of `x`.
    pub fn fit(config: ForestConfig, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Self {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features.max(1));

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features,
            n_classes,
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let indices: Vec<usize> = if config.bootstrap && n_samples > 0 {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, y, &indices, params, &mut rng)
            })
            .collect();

        let mut feature_importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, imp) in feature_importances.iter_mut().zip(&tree.importances) {
                *total += imp;
            }
        }

        Self {
            trees,
            n_classes,
            feature_importances: normalize(feature_importances),
        }
    }

    /// Averaged class probabilities.
    pub fn predict_proba(&self, sample: ArrayView1<f64>) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, t) in probs.iter_mut().zip(tree.predict_proba(sample)) {
                *p += t;
            }
        }
        if !self.trees.is_empty() {
            let n = self.trees.len() as f64;
            probs.iter_mut().for_each(|p| *p /= n);
        }
        probs
    }

    /// Most probable class; ties go to the lower index.
    pub fn predict(&self, sample: ArrayView1<f64>) -> usize {
        let probs = self.predict_proba(sample);
        let mut best = 0;
        for (class, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = class;
            }
        }
        best
    }

    pub fn predict_batch(&self, x: &Array2<f64>) -> Vec<usize> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_tree_depth(&self) -> usize {
        self.trees.iter().map(|t| t.depth()).max().unwrap_or(0)
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn leaf(counts: &[usize], n: usize) -> Node {
    let distribution = if n == 0 {
        vec![1.0 / counts.len().max(1) as f64; counts.len()]
    } else {
        counts.iter().map(|&c| c as f64 / n as f64).collect()
    };
    Node::Leaf { distribution }
}

fn normalize(mut values: Vec<f64>) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
    values
}
