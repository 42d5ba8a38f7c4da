// Deterministic pseudo-random number generator.
//
// Minimal-standard Lehmer generator: multiplier 48271 over modulus 2^31 - 1.
// Hand-rolled and dependency-free on purpose. Board layouts must be
// reproducible from the advertised seed across builds, platforms and
// independent implementations of the protocol, so the generator is pinned
// here rather than borrowed from an RNG crate.

const MULTIPLIER: u64 = 48271;
const MODULUS: u64 = (1 << 31) - 1;

/// Lehmer LCG, the server's sole source of randomness.
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Seed the generator. The state is the seed reduced mod 2^31 - 1,
    /// with 0 mapped to 1 (0 is a fixed point of the recurrence).
    pub fn new(seed: u32) -> Self {
        let state = u64::from(seed) % MODULUS;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Advance and return the next value, in [1, 2^31 - 1).
    #[expect(clippy::cast_possible_truncation)]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * MULTIPLIER % MODULUS;
        self.state as u32
    }
}
