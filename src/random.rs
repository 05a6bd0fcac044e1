//! Thread scoped pseudo-random generator.
//!
//! Every sampling operation takes its generator explicitly as a `&mut dyn RngCore`.
//! For convenience each thread also has its own generator, lazily seeded from system entropy.
//! [`ThreadGenerator`] is a handle onto the current thread's generator.
//!
//! Threads never share a generator, so streams of different threads are independent.
//! Use [`set_seed`] for reproducible runs.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand_core::{Error, RngCore, SeedableRng};

thread_local! {
    static GENERATOR: RefCell<Option<StdRng>> = RefCell::new(None);
}

/// Reseed the current thread's generator deterministically.
pub fn set_seed(seed: u64) {
    GENERATOR.with(|g| *g.borrow_mut() = Some(StdRng::seed_from_u64(seed)));
}

/// Reseed the current thread's generator from system entropy.
pub fn set_random_seed() {
    GENERATOR.with(|g| *g.borrow_mut() = Some(StdRng::from_entropy()));
}

/// Run `f` with the current thread's generator.
pub fn with_generator<T, F: FnOnce(&mut dyn RngCore) -> T>(f: F) -> T {
    GENERATOR.with(|g| {
        let mut g = g.borrow_mut();
        let rng = g.get_or_insert_with(StdRng::from_entropy);
        f(rng)
    })
}

/// A handle onto the current thread's generator.
///
/// Zero sized, each call uses the generator of the thread it is made on.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadGenerator;

impl RngCore for ThreadGenerator {
    fn next_u32(&mut self) -> u32 {
        with_generator(|rng| rng.next_u32())
    }

    fn next_u64(&mut self) -> u64 {
        with_generator(|rng| rng.next_u64())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        with_generator(|rng| rng.fill_bytes(dest))
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        with_generator(|rng| rng.try_fill_bytes(dest))
    }
}
