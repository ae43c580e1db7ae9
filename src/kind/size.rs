use super::Domain;

/// Smallest length the engine accepts for a domain.
///
/// Real transforms need an even length so that the Nyquist term exists.
pub const fn min_fft_size(domain: Domain) -> usize {
    match domain {
        Domain::Real => 2,
        Domain::Complex => 1,
    }
}

pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Smallest power of two `>= n`, computed with integer arithmetic only.
///
/// `next_power_of_two(0) == 1`.
///
/// # Panics
///
/// When the result does not fit in `usize`, i.e. `n > 1 << (usize::BITS - 1)`.
pub const fn next_power_of_two(n: usize) -> usize {
    match n.checked_next_power_of_two() {
        Some(p) => p,
        None => panic!("next power of two overflows usize"),
    }
}

fn is_smooth(mut n: usize) -> bool {
    for factor in [2, 3, 5] {
        while n % factor == 0 {
            n /= factor;
        }
    }
    n == 1
}

/// Whether the engine can create a setup of length `n` for `domain`.
pub fn is_valid_size(n: usize, domain: Domain) -> bool {
    let min = min_fft_size(domain);
    n >= min && n % min == 0 && is_smooth(n)
}

/// Smallest `2^a * 3^b * 5^c >= n`, `None` when it does not fit in `usize`.
fn good_size_cc(n: usize) -> Option<usize> {
    let mut best = n.checked_next_power_of_two();
    let below_best = |f: usize, best: Option<usize>| best.map_or(true, |b| f < b);

    let mut f5 = Some(1usize);
    while let Some(five) = f5.filter(|&f| below_best(f, best)) {
        let mut f35 = Some(five);
        while let Some(three) = f35.filter(|&f| below_best(f, best)) {
            let mut fac = Some(three);
            while let Some(f) = fac.filter(|&f| f < n) {
                fac = f.checked_mul(2);
            }
            if let Some(f) = fac {
                best = Some(best.map_or(f, |b| b.min(f)));
            }
            f35 = three.checked_mul(3);
        }
        f5 = five.checked_mul(5);
    }

    best
}

/// A valid length `>= n` for `domain`, preferring small 2·3·5 composites over
/// the next power of two.
///
/// # Panics
///
/// When no valid length `>= n` fits in `usize`.
pub fn good_size(n: usize, domain: Domain) -> usize {
    let size = match domain {
        Domain::Complex => good_size_cc(n.max(1)),
        Domain::Real => good_size_cc(n.max(1).div_ceil(2)).and_then(|s| s.checked_mul(2)),
    };
    match size {
        Some(size) => size.max(min_fft_size(domain)),
        None => panic!("no valid {domain:?} FFT length >= {n} fits in usize"),
    }
}
