//! Pairwise similarity between positional signal profiles.
//!
//! Correlation is computed over the *runs* of a [`ReducedProfile`], not raw
//! positions, which keeps the O(n²) pairwise pass tractable. Undefined
//! correlations (fewer than two overlapping samples, or zero variance) are
//! data, not errors: they propagate through the matrix as `NaN`.

use fnv::FnvHashSet;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use crate::peptide::ProteinRecord;
use crate::reduce::{ReducedProfile, Run};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

/// Parameters for one correlation-matrix computation.
#[derive(Debug, Clone)]
pub struct CorrelationRequest {
    pub method: CorrelationMethod,
    /// Experiments to correlate over, always iterated in universe order.
    /// Empty means all experiments.
    pub selected_experiments: FnvHashSet<Arc<str>>,
    /// Restrict the matrix to runs reachable from a position whose residue
    /// is in this set. `None` includes every run.
    pub residue_filter: Option<FnvHashSet<char>>,
    /// Signed shift applied to each filter-matching position before run
    /// lookup, clamped to `[1, protein_len]`
    pub offset: i32,
    /// Min-max normalize each run's vector over its own non-gap values
    /// before correlating
    pub normalize: bool,
}

impl Default for CorrelationRequest {
    fn default() -> Self {
        CorrelationRequest {
            method: CorrelationMethod::Pearson,
            selected_experiments: FnvHashSet::default(),
            residue_filter: None,
            offset: 0,
            normalize: false,
        }
    }
}

/// Correlation between two gapped vectors using pairwise-complete overlap:
/// only components present in *both* vectors at the same index contribute.
///
/// Returns `NaN` when fewer than two overlapping pairs exist or when either
/// restricted vector has zero variance.
pub fn correlate(a: &[Option<f64>], b: &[Option<f64>], method: CorrelationMethod) -> f64 {
    let mut xs = Vec::with_capacity(a.len().min(b.len()));
    let mut ys = Vec::with_capacity(xs.capacity());
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            xs.push(*x);
            ys.push(*y);
        }
    }
    if xs.len() < 2 {
        return f64::NAN;
    }
    match method {
        CorrelationMethod::Pearson => pearson(&xs, &ys),
        CorrelationMethod::Spearman => pearson(&ranks(&xs), &ranks(&ys)),
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

/// Average ranks starting at 1.0; ties receive the mean of the ranks they
/// span
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_unstable_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut lo = 0;
    while lo < order.len() {
        let mut hi = lo;
        while hi + 1 < order.len() && values[order[hi + 1]] == values[order[lo]] {
            hi += 1;
        }
        let rank = (lo + hi) as f64 / 2.0 + 1.0;
        for &idx in &order[lo..=hi] {
            ranks[idx] = rank;
        }
        lo = hi + 1;
    }
    ranks
}

/// Fisher z-transform of a correlation coefficient, for averaging
/// coefficients in z-space
pub fn fishers_z(r: f64) -> f64 {
    0.5 * ((1.0 + r) / (1.0 - r)).ln()
}

/// Inverse of [`fishers_z`]
pub fn fishers_z_inv(z: f64) -> f64 {
    ((2.0 * z).exp() - 1.0) / ((2.0 * z).exp() + 1.0)
}

/// Base-2 log used for display transforms. Zero has no defined log and
/// propagates as `NaN` rather than `-inf`.
pub fn log2(x: u64) -> f64 {
    if x == 0 {
        f64::NAN
    } else {
        (x as f64).log2()
    }
}

/// Min-max normalize a gapped vector into `[0, 1]` over its own non-gap
/// values. Gaps stay gaps; a constant vector normalizes to all zeros.
pub fn normalize_min_max(values: &[Option<u64>]) -> Vec<Option<f64>> {
    let min = values.iter().flatten().copied().min();
    let max = values.iter().flatten().copied().max();
    match (min, max) {
        (Some(min), Some(max)) if max > min => values
            .iter()
            .map(|v| v.map(|v| (v - min) as f64 / (max - min) as f64))
            .collect(),
        _ => values.iter().map(|v| v.map(|_| 0.0)).collect(),
    }
}

/// Symmetric pairwise correlation matrix over the (optionally filtered) runs
/// of a reduced profile. Rows and columns are ordered by ascending run start,
/// so the layout is deterministic for a given input.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    runs: Vec<Run>,
    /// Row-major `n × n`
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Compute the full pairwise matrix for `request`.
    ///
    /// With a residue filter, a run is included when `position + offset`
    /// (clamped to the protein) lands inside it for any position whose
    /// residue is in the filter. Each unordered pair is computed once and
    /// mirrored, so `M[a][b] == M[b][a]` bit-for-bit; the diagonal is `1.0`
    /// exactly, or `NaN` for a run with zero variance.
    pub fn build(
        reduced: &ReducedProfile,
        protein: &ProteinRecord,
        request: &CorrelationRequest,
    ) -> CorrelationMatrix {
        let columns: Vec<usize> = if request.selected_experiments.is_empty() {
            (0..reduced.experiments().len()).collect()
        } else {
            reduced
                .experiments()
                .labels()
                .iter()
                .enumerate()
                .filter(|(_, label)| request.selected_experiments.contains(label.as_ref()))
                .map(|(idx, _)| idx)
                .collect()
        };

        let selected: Vec<&(Run, Vec<Option<u64>>)> = match &request.residue_filter {
            None => reduced.entries().iter().collect(),
            Some(filter) => {
                let protein_len = protein.len();
                let mut seen = FnvHashSet::default();
                let mut picked = Vec::new();
                for position in 1..=protein_len {
                    match protein.residue_at(position) {
                        Some(residue) if filter.contains(&residue) => {}
                        _ => continue,
                    }
                    let shifted =
                        (position as i64 + request.offset as i64).clamp(1, protein_len as i64);
                    if let Some(entry) = reduced.run_at(shifted as u32) {
                        if seen.insert(entry.0) {
                            picked.push(entry);
                        }
                    }
                }
                picked.sort_by_key(|entry| entry.0.start);
                picked
            }
        };

        let runs: Vec<Run> = selected.iter().map(|entry| entry.0).collect();
        let vectors: Vec<Vec<Option<f64>>> = selected
            .iter()
            .map(|entry| {
                let restricted: Vec<Option<u64>> =
                    columns.iter().map(|&col| entry.1[col]).collect();
                if request.normalize {
                    normalize_min_max(&restricted)
                } else {
                    restricted.iter().map(|v| v.map(|v| v as f64)).collect()
                }
            })
            .collect();

        let n = runs.len();
        let method = request.method;
        log::info!(
            "correlating {} runs pairwise ({:?}, {} experiments)",
            n,
            method,
            columns.len()
        );

        // Pairs are independent, so the upper triangle parallelizes freely
        // without changing any numeric result
        let vectors = &vectors;
        let cells: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|row| {
                (row..n).map(move |col| {
                    let r = correlate(&vectors[row], &vectors[col], method);
                    let r = if row == col && !r.is_nan() { 1.0 } else { r };
                    (row, col, r)
                })
            })
            .collect();

        let mut values = vec![f64::NAN; n * n];
        for (row, col, r) in cells {
            values[row * n + col] = r;
            values[col * n + row] = r;
        }

        CorrelationMatrix { runs, values }
    }

    /// Row/column order of the matrix, ascending by run start
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Coefficient for a pair of runs, if both are in the matrix
    pub fn get(&self, a: Run, b: Run) -> Option<f64> {
        let row = self.runs.iter().position(|r| *r == a)?;
        let col = self.runs.iter().position(|r| *r == b)?;
        Some(self.values[row * self.runs.len() + col])
    }

    /// Sorted distribution of one run's correlations to every run in the
    /// matrix, *including* its self-correlation, so the result always holds
    /// exactly `len()` values.
    ///
    /// `NaN` cells are coerced to `0.0` before sorting: undefined correlation
    /// ranks as "no relationship". The coercion is lossy and biases the
    /// distribution toward the low end, but keeps the ordering total.
    pub fn ranked_distribution(&self, run: Run) -> Option<Vec<f64>> {
        let row = self.runs.iter().position(|r| *r == run)?;
        let n = self.runs.len();
        let mut values: Vec<f64> = self.values[row * n..(row + 1) * n]
            .iter()
            .map(|&v| if v.is_nan() { 0.0 } else { v })
            .collect();
        values.sort_unstable_by(|a, b| a.total_cmp(b));
        Some(values)
    }
}

impl std::ops::Index<(usize, usize)> for CorrelationMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.values[row * self.runs.len() + col]
    }
}
