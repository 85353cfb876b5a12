use crate::model::Classifier;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Gradient boosted trees in the layout produced by
/// `Booster.dump_model(..., dump_format="json")`, wrapped with the metadata
/// needed to turn margins into probabilities.
#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default = "default_base_score")]
    base_score: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
    trees: Vec<DumpNode>,
}

fn default_base_score() -> f64 {
    0.5
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
struct DumpNode {
    nodeid: u32,
    #[serde(default)]
    leaf: Option<f64>,
    #[serde(default)]
    split: Option<String>,
    #[serde(default)]
    split_condition: Option<f64>,
    #[serde(default)]
    yes: Option<u32>,
    #[serde(default)]
    no: Option<u32>,
    #[serde(default)]
    missing: Option<u32>,
    #[serde(default)]
    children: Vec<DumpNode>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        missing: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn leaf_value(&self, features: &[f64]) -> Result<f64> {
        let mut idx = 0;
        // a well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match &self.nodes[idx] {
                Node::Leaf(v) => return Ok(*v),
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = features[*feature];
                    idx = if x.is_nan() {
                        *missing
                    } else if x < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
        bail!("tree traversal did not terminate")
    }
}

pub struct TreeEnsemble {
    name: String,
    feature_count: usize,
    base_margin: f64,
    threshold: f64,
    trees: Vec<Tree>,
}

impl std::fmt::Debug for TreeEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEnsemble")
            .field("name", &self.name)
            .field("feature_count", &self.feature_count)
            .field("trees", &self.trees.len())
            .finish()
    }
}

impl TreeEnsemble {
    pub fn load(path: &Path, feature_names: &[&str]) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "tree_ensemble".to_string());
        Self::from_json(&raw, feature_names, name)
            .with_context(|| format!("invalid model artifact {}", path.display()))
    }

    pub fn from_json(raw: &str, feature_names: &[&str], name: String) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(raw)?;

        if let Some(names) = &artifact.feature_names {
            if names.iter().map(String::as_str).ne(feature_names.iter().copied()) {
                bail!(
                    "artifact features {:?} do not match expected {:?}",
                    names,
                    feature_names
                );
            }
        }
        if !(artifact.base_score > 0.0 && artifact.base_score < 1.0) {
            bail!("base_score must be in (0, 1), got {}", artifact.base_score);
        }
        if !(0.0..=1.0).contains(&artifact.threshold) {
            bail!("threshold must be in [0, 1], got {}", artifact.threshold);
        }
        if artifact.trees.is_empty() {
            bail!("artifact contains no trees");
        }

        let index: HashMap<&str, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, i))
            .collect();

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, root)| compile_tree(root, &index).with_context(|| format!("tree {i}")))
            .collect::<Result<Vec<_>>>()?;

        let p = artifact.base_score;
        Ok(Self {
            name,
            feature_count: feature_names.len(),
            base_margin: (p / (1.0 - p)).ln(),
            threshold: artifact.threshold,
            trees,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn probability(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.feature_count {
            bail!(
                "expected {} features, got {}",
                self.feature_count,
                features.len()
            );
        }
        let mut margin = self.base_margin;
        for tree in &self.trees {
            margin += tree.leaf_value(features)?;
        }
        let p = sigmoid(margin);
        if !p.is_finite() {
            bail!("model produced a non-finite probability");
        }
        Ok(p)
    }
}

impl Classifier for TreeEnsemble {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f64]) -> Result<i64> {
        let p = self.probability(features)?;
        Ok(if p > self.threshold { 1 } else { 0 })
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let p = self.probability(features)?;
        Ok(vec![1.0 - p, p])
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn resolve_feature(split: &str, index: &HashMap<&str, usize>) -> Result<usize> {
    if let Some(i) = index.get(split) {
        return Ok(*i);
    }
    // unnamed dumps refer to columns as f0, f1, ...
    split
        .strip_prefix('f')
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|i| *i < index.len())
        .ok_or_else(|| anyhow!("unknown split feature {split:?}"))
}

fn compile_tree(root: &DumpNode, index: &HashMap<&str, usize>) -> Result<Tree> {
    let mut flat: Vec<&DumpNode> = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        flat.push(node);
        stack.extend(node.children.iter());
    }

    let mut position: HashMap<u32, usize> = HashMap::new();
    for (pos, node) in flat.iter().enumerate() {
        if position.insert(node.nodeid, pos).is_some() {
            bail!("duplicate nodeid {}", node.nodeid);
        }
    }
    let lookup = |id: Option<u32>, field: &str, nodeid: u32| -> Result<usize> {
        let id = id.ok_or_else(|| anyhow!("node {nodeid} is missing {field}"))?;
        position
            .get(&id)
            .copied()
            .ok_or_else(|| anyhow!("node {nodeid} points {field} to unknown node {id}"))
    };

    let mut nodes = Vec::with_capacity(flat.len());
    for node in &flat {
        if let Some(v) = node.leaf {
            nodes.push(Node::Leaf(v));
            continue;
        }
        let split = node
            .split
            .as_deref()
            .ok_or_else(|| anyhow!("node {} has neither leaf nor split", node.nodeid))?;
        let threshold = node
            .split_condition
            .ok_or_else(|| anyhow!("node {} is missing split_condition", node.nodeid))?;
        let yes = lookup(node.yes, "yes", node.nodeid)?;
        let no = lookup(node.no, "no", node.nodeid)?;
        let missing = match node.missing {
            Some(_) => lookup(node.missing, "missing", node.nodeid)?,
            None => yes,
        };
        nodes.push(Node::Split {
            feature: resolve_feature(split, index)?,
            threshold,
            yes,
            no,
            missing,
        });
    }

    Ok(Tree { nodes })
}
