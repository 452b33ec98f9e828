//! Diagonal-covariance Gaussian hidden Markov model.
//!
//! Fitting is plain Baum-Welch over several independent sequences:
//!
//! - means start from a farthest-first k-means seeded by the caller's seed
//! - every state starts with the global per-feature variance
//! - start and transition probabilities start uniform
//! - EM runs until the log-likelihood gain drops below `tol` or `n_iter`
//!   iterations have run (non-convergence is still a successful fit)
//!
//! Forward/backward run in log space with log-sum-exp, so a sequence the model
//! explains badly still gets a finite (very negative) log-likelihood even when
//! EM has driven some start or transition probabilities to zero.

use nalgebra::{DMatrix, DVector, RowDVector};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Sequence, SequenceSet};
use crate::error::{FitFailure, ScoreFailure};
use crate::fit::{SequenceModel, Trainer};
use crate::math::{column_variances, log_gaussian_diag, log_sum_exp, normalize, sq_dist};

/// Lloyd iterations used to initialize the state means.
const KMEANS_ITERS: usize = 10;

/// States with less posterior mass than this keep their previous emission.
const MIN_OCCUPANCY: f64 = 1e-10;

/// Baum-Welch settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianHmmTrainer {
    pub n_iter: usize,
    /// Convergence threshold on the log-likelihood gain per iteration.
    pub tol: f64,
    /// Floor added to every variance.
    pub min_covar: f64,
}

impl Default for GaussianHmmTrainer {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            tol: 1e-2,
            min_covar: 1e-3,
        }
    }
}

impl GaussianHmmTrainer {
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }
}

impl Trainer for GaussianHmmTrainer {
    type Model = GaussianHmm;

    fn fit(
        &self,
        observations: &SequenceSet,
        n_components: usize,
        seed: u64,
    ) -> Result<GaussianHmm, FitFailure> {
        let data = observations.data();
        if n_components == 0 {
            return Err(FitFailure::InvalidComponents(n_components));
        }
        if data.nrows() < n_components {
            return Err(FitFailure::InsufficientData {
                rows: data.nrows(),
                n_components,
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(FitFailure::NonFinite);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let means = kmeans_means(data, n_components, &mut rng);
        let global_var = column_variances(data, self.min_covar);
        let mut vars = DMatrix::zeros(n_components, data.ncols());
        for j in 0..n_components {
            vars.set_row(j, &global_var);
        }
        let uniform = 1.0 / n_components as f64;

        let mut model = GaussianHmm {
            startprob: DVector::from_element(n_components, uniform),
            transmat: DMatrix::from_element(n_components, n_components, uniform),
            means,
            vars,
            log_likelihood: f64::NEG_INFINITY,
            n_iter: 0,
            converged: false,
        };

        let mut prev = f64::NEG_INFINITY;
        for iter in 0..self.n_iter {
            let stats = model.accumulate(observations)?;
            let ll = stats.log_likelihood;
            model.maximize(&stats, self.min_covar)?;
            model.log_likelihood = ll;
            model.n_iter = iter + 1;

            if (ll - prev).abs() < self.tol {
                model.converged = true;
                break;
            }
            prev = ll;
        }

        if !model.converged {
            tracing::debug!(
                n_components,
                n_iter = model.n_iter,
                "Baum-Welch stopped before converging"
            );
        }

        Ok(model)
    }
}

/// A fitted diagonal Gaussian HMM.
#[derive(Debug, Clone)]
pub struct GaussianHmm {
    startprob: DVector<f64>,
    transmat: DMatrix<f64>,
    /// `n_components × n_features`.
    means: DMatrix<f64>,
    /// `n_components × n_features`, diagonal covariances.
    vars: DMatrix<f64>,
    log_likelihood: f64,
    n_iter: usize,
    converged: bool,
}

/// Sufficient statistics of one E-step.
struct Stats {
    start: DVector<f64>,
    trans: DMatrix<f64>,
    post: DVector<f64>,
    obs: DMatrix<f64>,
    obs_sq: DMatrix<f64>,
    log_likelihood: f64,
}

/// Log-space forward pass of one sequence.
struct Forward {
    /// Emission log-densities, `len × n`.
    log_b: DMatrix<f64>,
    log_alpha: DMatrix<f64>,
    log_trans: DMatrix<f64>,
    log_likelihood: f64,
}

impl GaussianHmm {
    /// Build a model from explicit parameters (used for sampling synthetic data).
    ///
    /// Probabilities are renormalized; variances must be positive.
    pub fn from_params(
        startprob: DVector<f64>,
        transmat: DMatrix<f64>,
        means: DMatrix<f64>,
        vars: DMatrix<f64>,
    ) -> Result<Self, FitFailure> {
        let n = startprob.len();
        if n == 0 {
            return Err(FitFailure::InvalidComponents(0));
        }
        if transmat.shape() != (n, n) || means.nrows() != n || vars.shape() != means.shape() {
            return Err(FitFailure::Degenerate("parameter shapes disagree".to_string()));
        }
        if vars.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(FitFailure::Degenerate("variances must be positive".to_string()));
        }

        let mut startprob = startprob;
        normalize(&mut startprob)
            .ok_or_else(|| FitFailure::Degenerate("start probabilities have no mass".to_string()))?;
        let mut transmat = transmat;
        for i in 0..n {
            let mut row: DVector<f64> = transmat.row(i).transpose();
            normalize(&mut row)
                .ok_or_else(|| FitFailure::Degenerate(format!("transition row {i} has no mass")))?;
            transmat.set_row(i, &row.transpose());
        }

        Ok(Self {
            startprob,
            transmat,
            means,
            vars,
            log_likelihood: f64::NAN,
            n_iter: 0,
            converged: true,
        })
    }

    pub fn startprob(&self) -> &DVector<f64> {
        &self.startprob
    }

    pub fn transmat(&self) -> &DMatrix<f64> {
        &self.transmat
    }

    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    pub fn vars(&self) -> &DMatrix<f64> {
        &self.vars
    }

    /// Training log-likelihood at the last EM iteration.
    pub fn training_log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Draw one sequence of `len` frames.
    pub fn sample<R: Rng>(&self, len: usize, rng: &mut R) -> Result<Sequence, FitFailure> {
        let n = self.startprob.len();
        let start: WeightedIndex<f64> = WeightedIndex::new(self.startprob.iter())
            .map_err(|e| FitFailure::Degenerate(format!("start distribution: {e}")))?;
        let rows: Vec<WeightedIndex<f64>> = (0..n)
            .map(|i| {
                WeightedIndex::new(self.transmat.row(i).iter())
                    .map_err(|e| FitFailure::Degenerate(format!("transition row {i}: {e}")))
            })
            .collect::<Result<_, _>>()?;

        let mut out = Vec::with_capacity(len);
        let mut state = start.sample(rng);
        for t in 0..len {
            if t > 0 {
                state = rows[state].sample(rng);
            }
            let mut frame = Vec::with_capacity(self.means.ncols());
            for d in 0..self.means.ncols() {
                let normal = Normal::new(self.means[(state, d)], self.vars[(state, d)].sqrt())
                    .map_err(|e| FitFailure::Degenerate(format!("emission: {e}")))?;
                frame.push(normal.sample(rng));
            }
            out.push(frame);
        }
        Ok(out)
    }

    fn forward(&self, data: &DMatrix<f64>, start: usize, len: usize) -> Option<Forward> {
        let n = self.startprob.len();
        let log_start = self.startprob.map(f64::ln);
        let log_trans = self.transmat.map(f64::ln);

        let mut log_b = DMatrix::zeros(len, n);
        for t in 0..len {
            let x = data.row(start + t);
            for j in 0..n {
                log_b[(t, j)] = log_gaussian_diag(x.iter(), self.means.row(j).iter(), self.vars.row(j).iter());
            }
        }

        let mut log_alpha = DMatrix::zeros(len, n);
        let mut work = vec![0.0; n];
        for t in 0..len {
            for j in 0..n {
                let prior = if t == 0 {
                    log_start[j]
                } else {
                    for i in 0..n {
                        work[i] = log_alpha[(t - 1, i)] + log_trans[(i, j)];
                    }
                    log_sum_exp(&work)
                };
                log_alpha[(t, j)] = prior + log_b[(t, j)];
            }
        }

        let last: Vec<f64> = log_alpha.row(len.checked_sub(1)?).iter().copied().collect();
        let log_likelihood = log_sum_exp(&last);
        log_likelihood.is_finite().then_some(Forward {
            log_b,
            log_alpha,
            log_trans,
            log_likelihood,
        })
    }

    fn accumulate(&self, observations: &SequenceSet) -> Result<Stats, FitFailure> {
        let n = self.startprob.len();
        let f = self.means.ncols();
        let data = observations.data();
        let mut stats = Stats {
            start: DVector::zeros(n),
            trans: DMatrix::zeros(n, n),
            post: DVector::zeros(n),
            obs: DMatrix::zeros(n, f),
            obs_sq: DMatrix::zeros(n, f),
            log_likelihood: 0.0,
        };

        let mut work = vec![0.0; n];
        for (start, len) in observations.spans() {
            let fwd = self
                .forward(data, start, len)
                .ok_or_else(|| FitFailure::Degenerate("sequence has zero likelihood".to_string()))?;
            let ll = fwd.log_likelihood;
            stats.log_likelihood += ll;

            let mut log_beta = DMatrix::zeros(len, n);
            for t in (0..len.saturating_sub(1)).rev() {
                for i in 0..n {
                    for j in 0..n {
                        work[j] = fwd.log_trans[(i, j)] + fwd.log_b[(t + 1, j)] + log_beta[(t + 1, j)];
                    }
                    log_beta[(t, i)] = log_sum_exp(&work);
                }
            }

            for t in 0..len {
                let x = data.row(start + t);
                for j in 0..n {
                    let gamma = (fwd.log_alpha[(t, j)] + log_beta[(t, j)] - ll).exp();
                    if t == 0 {
                        stats.start[j] += gamma;
                    }
                    stats.post[j] += gamma;
                    for d in 0..f {
                        stats.obs[(j, d)] += gamma * x[d];
                        stats.obs_sq[(j, d)] += gamma * x[d] * x[d];
                    }
                }
                if t + 1 < len {
                    for i in 0..n {
                        for j in 0..n {
                            stats.trans[(i, j)] += (fwd.log_alpha[(t, i)]
                                + fwd.log_trans[(i, j)]
                                + fwd.log_b[(t + 1, j)]
                                + log_beta[(t + 1, j)]
                                - ll)
                                .exp();
                        }
                    }
                }
            }
        }

        Ok(stats)
    }

    fn maximize(&mut self, stats: &Stats, min_covar: f64) -> Result<(), FitFailure> {
        let n = self.startprob.len();

        let mut start = stats.start.clone();
        if normalize(&mut start).is_some() {
            self.startprob = start;
        }

        for i in 0..n {
            let mut row: DVector<f64> = stats.trans.row(i).transpose();
            if normalize(&mut row).is_some() {
                self.transmat.set_row(i, &row.transpose());
            }
        }

        for j in 0..n {
            let mass = stats.post[j];
            if mass <= MIN_OCCUPANCY {
                continue;
            }
            let mean: RowDVector<f64> = stats.obs.row(j) / mass;
            let second: RowDVector<f64> = stats.obs_sq.row(j) / mass;
            let var = (second - mean.component_mul(&mean)).map(|v| (v + min_covar).max(min_covar));
            self.means.set_row(j, &mean);
            self.vars.set_row(j, &var);
        }

        let finite = self.startprob.iter().all(|v| v.is_finite())
            && self.transmat.iter().all(|v| v.is_finite())
            && self.means.iter().all(|v| v.is_finite())
            && self.vars.iter().all(|v| v.is_finite() && *v > 0.0);
        if !finite {
            return Err(FitFailure::Degenerate(
                "EM produced non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }
}

impl SequenceModel for GaussianHmm {
    fn n_components(&self) -> usize {
        self.startprob.len()
    }

    fn n_features(&self) -> usize {
        self.means.ncols()
    }

    fn score(&self, observations: &SequenceSet) -> Result<f64, ScoreFailure> {
        if observations.n_features() != self.n_features() {
            return Err(ScoreFailure::DimensionMismatch {
                expected: self.n_features(),
                got: observations.n_features(),
            });
        }
        if observations.n_rows() == 0 {
            return Err(ScoreFailure::Empty);
        }

        let mut total = 0.0;
        for (start, len) in observations.spans() {
            let fwd = self
                .forward(observations.data(), start, len)
                .ok_or(ScoreFailure::NonFinite)?;
            total += fwd.log_likelihood;
        }
        if total.is_finite() {
            Ok(total)
        } else {
            Err(ScoreFailure::NonFinite)
        }
    }
}

/// Farthest-first seeding followed by a few Lloyd iterations.
///
/// Requires `k <= data.nrows()`.
fn kmeans_means(data: &DMatrix<f64>, k: usize, rng: &mut StdRng) -> DMatrix<f64> {
    let rows = data.nrows();
    let f = data.ncols();

    let mut chosen = vec![rng.gen_range(0..rows)];
    while chosen.len() < k {
        let mut best = (0usize, f64::NEG_INFINITY);
        for i in 0..rows {
            if chosen.contains(&i) {
                continue;
            }
            let nearest = chosen
                .iter()
                .map(|&c| sq_dist(data.row(i).iter(), data.row(c).iter()))
                .fold(f64::INFINITY, f64::min);
            if nearest > best.1 {
                best = (i, nearest);
            }
        }
        chosen.push(best.0);
    }

    let mut centers = DMatrix::zeros(k, f);
    for (j, &i) in chosen.iter().enumerate() {
        centers.set_row(j, &data.row(i));
    }

    for _ in 0..KMEANS_ITERS {
        let mut sums = DMatrix::<f64>::zeros(k, f);
        let mut counts = vec![0usize; k];
        for i in 0..rows {
            let mut nearest = (0usize, f64::INFINITY);
            for j in 0..k {
                let d = sq_dist(data.row(i).iter(), centers.row(j).iter());
                if d < nearest.1 {
                    nearest = (j, d);
                }
            }
            let row = sums.row(nearest.0) + data.row(i);
            sums.set_row(nearest.0, &row);
            counts[nearest.0] += 1;
        }
        for j in 0..k {
            if counts[j] > 0 {
                let mean = sums.row(j) / counts[j] as f64;
                centers.set_row(j, &mean);
            }
        }
    }

    centers
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated regimes, alternating every five frames.
    fn two_regime_set(n_seq: usize, len: usize) -> SequenceSet {
        let seqs: Vec<Sequence> = (0..n_seq)
            .map(|s| {
                (0..len)
                    .map(|t| {
                        let level = if (t / 5) % 2 == 0 { -5.0 } else { 5.0 };
                        let jitter = 0.3 * ((t * 7 + s * 3) as f64).sin();
                        vec![level + jitter, 0.5 * level - jitter]
                    })
                    .collect()
            })
            .collect();
        SequenceSet::from_sequences(&seqs).unwrap()
    }

    #[test]
    fn fits_two_regimes_and_scores_finite() {
        let set = two_regime_set(4, 20);
        let model = GaussianHmmTrainer::default().fit(&set, 2, 14).unwrap();
        assert_eq!(model.n_components(), 2);
        assert_eq!(model.n_features(), 2);

        let mut first: Vec<f64> = model.means().column(0).iter().copied().collect();
        first.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((first[0] + 5.0).abs() < 1.0, "means: {first:?}");
        assert!((first[1] - 5.0).abs() < 1.0, "means: {first:?}");

        let score = model.score(&set).unwrap();
        assert!(score.is_finite());
        assert!(model.converged());
        assert!(model.n_iter() >= 1 && model.n_iter() <= 1000);
        // EM never lowers the likelihood, so the refined model scores at least
        // as well as the last E-step saw.
        assert!(score >= model.training_log_likelihood() - 1e-6);
        assert!(model.vars().iter().all(|&v| v >= 1e-3));
        for i in 0..2 {
            let row_sum: f64 = model.transmat().row(i).sum();
            assert!((row_sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_gives_same_model() {
        let set = two_regime_set(3, 15);
        let trainer = GaussianHmmTrainer::default();
        let a = trainer.fit(&set, 3, 7).unwrap();
        let b = trainer.fit(&set, 3, 7).unwrap();
        assert_eq!(a.means(), b.means());
        assert_eq!(a.score(&set).unwrap(), b.score(&set).unwrap());
    }

    #[test]
    fn too_few_rows_is_a_fit_failure() {
        let set = SequenceSet::from_sequences(&[vec![vec![1.0], vec![2.0]]]).unwrap();
        let err = GaussianHmmTrainer::default().fit(&set, 3, 0).unwrap_err();
        assert_eq!(
            err,
            FitFailure::InsufficientData {
                rows: 2,
                n_components: 3
            }
        );
    }

    #[test]
    fn zero_states_and_nan_inputs_are_rejected() {
        let trainer = GaussianHmmTrainer::default();
        let set = two_regime_set(1, 10);
        assert_eq!(trainer.fit(&set, 0, 0).unwrap_err(), FitFailure::InvalidComponents(0));

        let nan = SequenceSet::from_sequences(&[vec![vec![f64::NAN], vec![1.0], vec![2.0]]]).unwrap();
        assert_eq!(trainer.fit(&nan, 2, 0).unwrap_err(), FitFailure::NonFinite);
    }

    #[test]
    fn scoring_other_dimensionality_fails() {
        let set = two_regime_set(2, 10);
        let model = GaussianHmmTrainer::default().fit(&set, 2, 1).unwrap();
        let other = SequenceSet::from_sequences(&[vec![vec![1.0, 2.0, 3.0]]]).unwrap();
        assert_eq!(
            model.score(&other).unwrap_err(),
            ScoreFailure::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn far_shifted_data_scores_finite_and_much_lower() {
        let set = two_regime_set(4, 20);
        let model = GaussianHmmTrainer::default().fit(&set, 2, 3).unwrap();
        let shifted = SequenceSet::from_parts(set.data().map(|v| v + 20.0), set.lengths().to_vec()).unwrap();

        let own = model.score(&set).unwrap();
        let far = model.score(&shifted).unwrap();
        assert!(far.is_finite());
        assert!(far < own - 1000.0, "own={own} far={far}");
    }

    #[test]
    fn unreachable_states_do_not_break_scoring() {
        // State 0 can never be entered, and the data sits right on it.
        let model = GaussianHmm::from_params(
            DVector::from_vec(vec![0.0, 1.0]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            DMatrix::from_row_slice(2, 1, &[0.0, 100.0]),
            DMatrix::from_element(2, 1, 0.5),
        )
        .unwrap();
        let set = SequenceSet::from_sequences(&[vec![vec![0.0], vec![0.1], vec![-0.1]]]).unwrap();

        let score = model.score(&set).unwrap();
        assert!(score.is_finite());
        assert!(score < -20_000.0, "{score}");
    }

    #[test]
    fn sampled_sequences_have_requested_shape() {
        let model = GaussianHmm::from_params(
            DVector::from_vec(vec![1.0, 1.0]),
            DMatrix::from_row_slice(2, 2, &[0.9, 0.1, 0.2, 0.8]),
            DMatrix::from_row_slice(2, 3, &[0.0, 0.0, 0.0, 4.0, 4.0, 4.0]),
            DMatrix::from_element(2, 3, 0.5),
        )
        .unwrap();
        assert!((model.startprob()[0] - 0.5).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(5);
        let seq = model.sample(12, &mut rng).unwrap();
        assert_eq!(seq.len(), 12);
        assert!(seq.iter().all(|frame| frame.len() == 3));
    }
}
