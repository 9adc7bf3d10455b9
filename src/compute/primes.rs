use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrimeSummary {
    pub count: usize,
    pub largest: Option<u64>,
}

/// Counts primes in `2..=max` by trial division up to the square root.
pub fn prime_summary(max: u64) -> PrimeSummary {
    let mut summary = PrimeSummary {
        count: 0,
        largest: None,
    };

    for num in 2..=max {
        if is_prime(num) {
            summary.count += 1;
            summary.largest = Some(num);
        }
    }

    summary
}

fn is_prime(num: u64) -> bool {
    let mut divisor = 2u64;
    while divisor.saturating_mul(divisor) <= num {
        if num.is_multiple_of(divisor) {
            return false;
        }
        divisor += 1;
    }
    true
}
