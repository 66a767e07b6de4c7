pub fn argsort(v: &[f64]) -> Vec<usize> {
    let mut idx = (0..v.len()).collect::<Vec<_>>();

    idx.sort_by(|&i, &j| v[i].total_cmp(&v[j]));

    idx
}

/// N even, 8
///
/// n : 0 1 2 3 4 5 6 7
///
/// i : 0 1 2 3 4 -3 -2 -1
///
/// N Odd, 7
///
/// n : 0 1 2 3 4 5 6
///
/// i : 0 1 2 3 -3 -2 -1
///
/// signed frequency -> storage index
pub fn fft_i2n(i: i32, ntot: usize) -> usize {
    if i < 0 {
        (i + ntot as i32) as usize
    } else {
        i as usize
    }
}

/// storage index -> signed frequency
pub fn fft_n2i(n: usize, ntot: usize) -> i32 {
    if n > ntot / 2 {
        n as i32 - ntot as i32
    } else {
        n as i32
    }
}

/// Number of bytes of `n` values of type T, in GB.
pub fn size_in_gb<T>(n: usize) -> f64 {
    (n * std::mem::size_of::<T>()) as f64 / 1.0E9
}
