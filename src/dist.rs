use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::Gamma;

use crate::error::{CptError, Result};

/// Clips negative weights to zero and rescales the rest to sum to one.
///
/// Fails on non-finite weights or an all-zero vector, since no index can be
/// sampled from either.
pub fn normalize(weights: &mut [f64]) -> Result<()> {
    let mut sum = 0.0;
    for w in weights.iter_mut() {
        if !w.is_finite() {
            return Err(CptError::DegenerateDistribution { len: weights.len() });
        }
        if *w < 0.0 {
            *w = 0.0;
        }
        sum += *w;
    }
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(CptError::DegenerateDistribution { len: weights.len() });
    }
    for w in weights.iter_mut() {
        *w /= sum;
    }
    Ok(())
}

/// Inverse-CDF lookup: the smallest index whose running total exceeds `u`.
///
/// Rounding can leave the total slightly below (or above) one; when `u` is
/// never exceeded the last index with positive mass is returned.
pub fn inverse_cdf(prop: &[f64], u: f64) -> usize {
    let mut sum = 0.0;
    let mut last = prop.len().saturating_sub(1);
    for (k, &p) in prop.iter().enumerate() {
        if p <= 0.0 {
            continue;
        }
        sum += p;
        last = k;
        if u < sum {
            return k;
        }
    }
    last
}

#[derive(Debug, Clone)]
pub struct Categorical {
    prop: Vec<f64>,
}

impl Categorical {
    pub fn new(mut weights: Vec<f64>) -> Result<Categorical> {
        normalize(&mut weights)?;
        Ok(Categorical {
            prop: weights,
        })
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.prop
    }
}

impl Distribution<usize> for Categorical {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        inverse_cdf(&self.prop, rng.gen::<f64>())
    }
}

#[derive(Debug, Clone)]
pub struct Dirichlet {
    gammas: Vec<Gamma<f64>>,
}

impl Dirichlet {
    pub fn new(alpha: &[f64]) -> Result<Dirichlet> {
        let mut gammas = Vec::with_capacity(alpha.len());
        for &a in alpha {
            let gamma = Gamma::new(a, 1.0)
                .map_err(|_| CptError::NonPositiveHyperparameter { name: "dirichlet concentration", value: a })?;
            gammas.push(gamma);
        }
        Ok(Dirichlet {
            gammas: gammas,
        })
    }

    pub fn symmetric(alpha: f64, dim: usize) -> Result<Dirichlet> {
        Dirichlet::new(&vec![alpha; dim])
    }
}

impl Distribution<Vec<f64>> for Dirichlet {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let mut xs: Vec<f64> = self.gammas.iter().map(|g| g.sample(rng)).collect();
        let sum: f64 = xs.iter().sum();
        if sum > 0.0 {
            for x in xs.iter_mut() {
                *x /= sum;
            }
        }
        else {
            // Tiny concentrations can underflow every variate
            let k = rng.gen_range(0..xs.len());
            xs[k] = 1.0;
        }
        xs
    }
}
