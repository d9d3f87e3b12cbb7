//! Contiguous free-run search
//!
//! A first-fit scan over an occupancy vector (`true` = taken). When the
//! vector is circular the scan may continue once past the end, so a run can
//! start near the tail and finish at the head.

/// Find the first run of `needed` free positions in `occupancy`
///
/// Returns the index of the run's first position, or `None` if no run
/// exists. `None` is also returned without scanning when `occupancy` is
/// empty, `needed` is zero, or `needed` exceeds the vector length.
///
/// # Arguments
/// * `occupancy` - Occupied flag per position
/// * `circular` - Whether the last position is adjacent to the first
/// * `needed` - Length of the run
///
/// # Examples
///
/// ```
/// use magazine_conveyor::magazine::find_run;
///
/// // [F, F, T, F] with wraparound: positions 3, 0, 1
/// assert_eq!(find_run(&[false, false, true, false], true, 3), Some(3));
/// assert_eq!(find_run(&[false, false, true, false], false, 3), None);
/// ```
pub fn find_run(occupancy: &[bool], circular: bool, needed: usize) -> Option<usize> {
    let len = occupancy.len();
    if len == 0 || needed == 0 || needed > len {
        return None;
    }

    // One forward pass, plus one wraparound pass for circular magazines
    let steps = if circular { 2 * len } else { len };
    let mut start: Option<usize> = None;
    let mut found = 0;

    for step in 0..steps {
        // Past the boundary only a run that began in the first pass may
        // continue, otherwise it would already have been found.
        if step >= len && start.is_none() {
            break;
        }

        let i = step % len;
        if occupancy[i] {
            start = None;
            found = 0;
            continue;
        }

        let run_start = *start.get_or_insert(i);
        found += 1;
        if found == needed {
            debug_assert!(found <= len);
            return Some(run_start);
        }
    }

    None
}

/// Positions covered by a run of `len` starting at `start`, wrapping modulo
/// `total`
pub fn run_positions(start: usize, len: usize, total: usize) -> impl Iterator<Item = usize> {
    (0..len).map(move |offset| (start + offset) % total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: bool = false;
    const T: bool = true;

    #[test]
    fn test_all_free_linear() {
        assert_eq!(find_run(&[F, F, F, F], false, 3), Some(0));
    }

    #[test]
    fn test_run_between_taken() {
        assert_eq!(find_run(&[T, F, F, T], false, 2), Some(1));
    }

    #[test]
    fn test_wraparound_run() {
        assert_eq!(find_run(&[F, T, T, F], true, 2), Some(3));
        assert_eq!(find_run(&[F, F, T, F], true, 3), Some(3));
    }

    #[test]
    fn test_wraparound_disabled() {
        assert_eq!(find_run(&[F, T, T, F], false, 2), None);
    }

    #[test]
    fn test_all_taken() {
        assert_eq!(find_run(&[T, T, T], true, 1), None);
        assert_eq!(find_run(&[T, T, T], false, 1), None);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(find_run(&[F, F], false, 3), None);
        assert_eq!(find_run(&[F, F], true, 3), None);
        assert_eq!(find_run(&[], true, 1), None);
        assert_eq!(find_run(&[F, F], false, 0), None);
    }

    #[test]
    fn test_whole_vector_run() {
        // A full-length run is found in the first pass and never overlaps itself
        assert_eq!(find_run(&[F, F, F, F], true, 4), Some(0));
        assert_eq!(find_run(&[F, F, F, T], true, 4), None);
    }

    #[test]
    fn test_forward_run_wins_over_wrapping_run() {
        // {0,1} and {4,0} both qualify; the forward pass reaches {0,1} first
        assert_eq!(find_run(&[F, F, F, T, F], true, 2), Some(0));
        assert_eq!(find_run(&[F, T, F, F, T, F], true, 2), Some(2));
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        // The 3-run at 0 wins even though the 2-run at 4 fits exactly
        assert_eq!(find_run(&[F, F, F, T, F, F, T], false, 2), Some(0));
    }

    #[test]
    fn test_single_free_slot_wraps_to_itself_is_rejected() {
        // Only index 2 is free; a wrapping scan must not count it twice
        assert_eq!(find_run(&[T, T, F], true, 2), None);
    }

    #[test]
    fn test_run_positions_wrap() {
        let positions: Vec<usize> = run_positions(3, 3, 4).collect();
        assert_eq!(positions, vec![3, 0, 1]);

        let positions: Vec<usize> = run_positions(1, 2, 4).collect();
        assert_eq!(positions, vec![1, 2]);
    }
}
