//! Binary random forest: CART trees on gini impurity, bootstrap samples,
//! sqrt feature sampling and per-bootstrap balanced class weights.

use crate::utils::error::{Result, RiskError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 250,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

// 節點存在扁平陣列中，避免深樹在 JSON 反序列化時超過遞迴上限
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Weighted class totals of a node.
#[derive(Debug, Clone, Copy, Default)]
struct ClassWeights {
    negative: f64,
    positive: f64,
}

impl ClassWeights {
    fn add(&mut self, label: u8, weight: f64) {
        if label == 1 {
            self.positive += weight;
        } else {
            self.negative += weight;
        }
    }

    fn total(&self) -> f64 {
        self.negative + self.positive
    }

    fn gini(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let p = self.positive / total;
        let q = self.negative / total;
        1.0 - p * p - q * q
    }

    fn proba(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            0.0
        } else {
            self.positive / total
        }
    }
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    class_weight: [f64; 2],
    params: &'a ForestParams,
    max_features: usize,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl<'a> TreeBuilder<'a> {
    fn weight(&self, sample: usize) -> f64 {
        self.class_weight[usize::from(self.y[sample] == 1)]
    }

    fn totals(&self, samples: &[usize]) -> ClassWeights {
        let mut totals = ClassWeights::default();
        for &s in samples {
            totals.add(self.y[s], self.weight(s));
        }
        totals
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let totals = self.totals(&samples);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: totals.proba(),
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let is_pure = totals.negative == 0.0 || totals.positive == 0.0;
        if depth_reached || is_pure || samples.len() < self.params.min_samples_split {
            return id;
        }

        let Some(best) = self.best_split(&samples, &totals, rng) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.x[s][best.feature] <= best.threshold);

        let left_id = self.build(left, depth + 1, rng);
        let right_id = self.build(right, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    /// 隨機順序檢查特徵，直到評估過 max_features 個非常數特徵為止。
    /// 沒有改善的切分也會被接受，樹會長到葉節點純為止。
    fn best_split(
        &self,
        samples: &[usize],
        totals: &ClassWeights,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n_features = self.x.first().map(Vec::len).unwrap_or(0);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut visited = 0;

        for feature in features {
            if visited >= self.max_features {
                break;
            }

            let mut sorted = samples.to_vec();
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let first = self.x[sorted[0]][feature];
            let last = self.x[sorted[sorted.len() - 1]][feature];
            if first == last {
                continue;
            }
            visited += 1;

            let mut left = ClassWeights::default();
            for pos in 0..sorted.len() - 1 {
                let s = sorted[pos];
                left.add(self.y[s], self.weight(s));

                let here = self.x[s][feature];
                let next = self.x[sorted[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let right = ClassWeights {
                    negative: totals.negative - left.negative,
                    positive: totals.positive - left.positive,
                };
                let impurity = left.gini() * left.total() + right.gini() * right.total();

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = here + (next - here) / 2.0;
                    // 中點在浮點上可能等於 next
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { proba }) => return *proba,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    id = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// `balanced_subsample`: n / (2 * count_c) computed on the bootstrap sample.
fn balanced_weights(y: &[u8], samples: &[usize]) -> [f64; 2] {
    let positives = samples.iter().filter(|&&s| y[s] == 1).count() as f64;
    let negatives = samples.len() as f64 - positives;
    let n = samples.len() as f64;
    let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 1.0 };
    [weight(negatives), weight(positives)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: ForestParams) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(RiskError::training(format!(
                "expected matching non-empty samples and labels, got {} rows and {} labels",
                x.len(),
                y.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(RiskError::training("n_trees must be at least 1"));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(RiskError::training("labels must be 0 or 1"));
        }

        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(RiskError::training("ragged feature matrix"));
        }
        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());
            let samples: Vec<usize> = (0..x.len()).map(|_| tree_rng.gen_range(0..x.len())).collect();

            let mut builder = TreeBuilder {
                x,
                y,
                class_weight: balanced_weights(y, &samples),
                params: &params,
                max_features,
                nodes: Vec::new(),
            };
            builder.build(samples, 0, &mut tree_rng);
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        tracing::debug!(
            "Fitted {} trees on {} samples x {} features (max_features={})",
            trees.len(),
            x.len(),
            n_features,
            max_features
        );

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Mean of the per-tree leaf probabilities for class 1.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) >= 0.5)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64;
            x.push(vec![v, (i % 3) as f64]);
            y.push(u8::from(i >= 25));
        }
        (x, y)
    }

    #[test]
    fn test_gini() {
        let pure = ClassWeights {
            negative: 4.0,
            positive: 0.0,
        };
        assert_eq!(pure.gini(), 0.0);
        let mixed = ClassWeights {
            negative: 2.0,
            positive: 2.0,
        };
        assert_eq!(mixed.gini(), 0.5);
    }

    #[test]
    fn test_balanced_weights() {
        let y = [0, 0, 0, 1];
        let w = balanced_weights(&y, &[0, 1, 2, 3]);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, params).unwrap();
        assert_eq!(forest.n_trees(), 25);

        assert_eq!(forest.predict(&[2.0, 0.0]), 0);
        assert_eq!(forest.predict(&[38.0, 1.0]), 1);
        for row in &x {
            let p = forest.predict_proba(row);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&x, &y, params).unwrap();
        let b = RandomForest::fit(&x, &y, params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let (x, y) = separable();
        let params = ForestParams {
            n_trees: 3,
            max_depth: Some(1),
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&x, &y, params).unwrap();
        assert!(forest.trees.iter().all(|t| t.node_count() <= 3));
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(RandomForest::fit(&[], &[], ForestParams::default()).is_err());
        assert!(RandomForest::fit(&[vec![1.0]], &[2], ForestParams::default()).is_err());
        assert!(RandomForest::fit(&[vec![1.0], vec![1.0, 2.0]], &[0, 1], ForestParams::default()).is_err());
    }
}
