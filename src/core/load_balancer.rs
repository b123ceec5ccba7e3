//! Per-request instance selection.
//!
//! Stateless uniform random choice: no session affinity, no health history.
//! The randomness source is owned by the balancer rather than pulled from the
//! ambient thread RNG, so tests can seed it and assert exact selections.
use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::ports::discovery::ServiceInstance;

/// Uniform random load balancer over a per-request instance set.
pub struct RandomBalancer {
    rng: Mutex<StdRng>,
}

impl RandomBalancer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic balancer for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick one instance uniformly at random. An empty set yields `None`
    /// (empty is a failure condition for the caller, not a valid pick); a
    /// single-element set returns that element without consulting the RNG.
    pub fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        match instances {
            [] => None,
            [only] => Some(only),
            _ => {
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let index = rng.random_range(0..instances.len());
                instances.get(index)
            }
        }
    }
}

impl Default for RandomBalancer {
    fn default() -> Self {
        Self::new()
    }
}
