/// Maps a possibly out-of-range coordinate back into `0..len` by mirroring
/// about the edge pixels (`-1 -> 1`, `len -> len - 2`).
///
/// `len` must be non-zero.
pub(crate) fn mirror_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }

    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len { r } else { (2 * len - 2) - r }
}
