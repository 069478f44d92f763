//! One-vs-one multi-class SVM
//!
//! One binary machine per class pair `(a, b)` with `a < b`, trained on the
//! samples of those two classes only (`a` as +1). Prediction counts one vote
//! per machine; ties go to the lowest class index.

use crate::core::{ClassifierError, Result, SVMModel, Sample, SolverConfig, SparseVector};
use crate::kernel::Kernel;
use crate::optimizer::{SVMOptimizer, TrainedSVM};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

struct PairMachine<K: Kernel> {
    positive: usize,
    negative: usize,
    model: TrainedSVM<K>,
}

/// Trained one-vs-one ensemble
pub struct OneVsOneSVM<K: Kernel> {
    classes: Vec<usize>,
    machines: Vec<PairMachine<K>>,
}

impl<K: Kernel> OneVsOneSVM<K> {
    /// Train every pairwise machine
    pub fn train(
        kernel: Arc<K>,
        config: &SolverConfig,
        rows: &[SparseVector],
        labels: &[usize],
    ) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: rows.len(),
                actual: labels.len(),
            });
        }
        if rows.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(i);
        }
        let classes: Vec<usize> = by_class.keys().copied().collect();

        let optimizer = SVMOptimizer::new(kernel, config.clone());
        let mut machines = Vec::with_capacity(classes.len() * classes.len().saturating_sub(1) / 2);

        for (a_pos, &a) in classes.iter().enumerate() {
            for &b in &classes[a_pos + 1..] {
                let samples: Vec<Sample> = by_class[&a]
                    .iter()
                    .map(|&i| Sample::new(rows[i].clone(), 1.0))
                    .chain(by_class[&b].iter().map(|&i| Sample::new(rows[i].clone(), -1.0)))
                    .collect();

                let model = optimizer.train_samples(&samples)?;
                debug!(
                    "Pair ({a}, {b}): {} samples, {} support vectors",
                    samples.len(),
                    model.n_support_vectors()
                );
                machines.push(PairMachine {
                    positive: a,
                    negative: b,
                    model,
                });
            }
        }

        Ok(Self { classes, machines })
    }

    /// Classes seen during training, ascending
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_machines(&self) -> usize {
        self.machines.len()
    }

    /// Total support vectors over all machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.model.n_support_vectors()).sum()
    }

    /// Majority vote over all pairwise machines
    pub fn predict_one(&self, x: &SparseVector) -> usize {
        if self.classes.len() == 1 {
            return self.classes[0];
        }

        let mut votes: BTreeMap<usize, usize> = self.classes.iter().map(|&c| (c, 0)).collect();
        for machine in &self.machines {
            let winner = if machine.model.decision_function(x) >= 0.0 {
                machine.positive
            } else {
                machine.negative
            };
            *votes.entry(winner).or_default() += 1;
        }

        let mut best_class = self.classes[0];
        let mut best_votes = 0;
        for (&class, &count) in &votes {
            if count > best_votes {
                best_votes = count;
                best_class = class;
            }
        }
        best_class
    }
}
