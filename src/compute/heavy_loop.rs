/// Sums `sqrt(i) * sin(i) * cos(i)` for `i` in `0..iterations`.
pub fn heavy_loop(iterations: u64) -> f64 {
    let mut sum = 0.0;
    for i in 0..iterations {
        let x = i as f64;
        sum += x.sqrt() * x.sin() * x.cos();
    }
    sum
}
