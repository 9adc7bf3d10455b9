/// Largest input whose Fibonacci number fits in a `u64`.
pub const MAX_FIBONACCI_N: u32 = 93;

/// Naive double recursion. Exponential on purpose: the point is to burn CPU in
/// one uninterrupted call.
pub fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}
