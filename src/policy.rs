use rand::Rng;

/// A request to change the visible slide. `Next`/`Previous`/`AutoAdvance`
/// are relative to the current index; `JumpTo` carries an explicit index and
/// is never randomized, even in random mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationRequest {
    Next,
    Previous,
    JumpTo(i64),
    AutoAdvance,
}

/// Resolve a navigation request to a concrete target index.
///
/// All arithmetic wraps around the slide count, so out-of-range jumps leap
/// across the boundary instead of erroring. With a single slide every
/// request resolves to 0, including random auto-advance.
pub fn resolve(
    current: usize,
    request: NavigationRequest,
    total: usize,
    random: bool,
    rng: &mut impl Rng,
) -> usize {
    debug_assert!(total > 0, "slide set is never empty");
    debug_assert!(current < total, "current index in range");
    match request {
        NavigationRequest::Next => (current + 1) % total,
        NavigationRequest::Previous => (current + total - 1) % total,
        NavigationRequest::JumpTo(index) => index.rem_euclid(total as i64) as usize,
        NavigationRequest::AutoAdvance if random => random_index(current, total, rng),
        NavigationRequest::AutoAdvance => (current + 1) % total,
    }
}

/// Uniform pick over `[0, total)` excluding `current`. A single-slide set
/// short-circuits to 0 so the rejection loop cannot spin forever.
fn random_index(current: usize, total: usize, rng: &mut impl Rng) -> usize {
    if total == 1 {
        return 0;
    }
    loop {
        let candidate = rng.random_range(0..total);
        if candidate != current {
            return candidate;
        }
    }
}
