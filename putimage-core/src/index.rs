/// Wrap a requested index into `[0, len)`.
///
/// Indices `>= len` wrap modulo `len`; negative indices count back from the
/// end, so `-1` is the last element. Returns `None` for an empty list.
pub fn wrap_index(index: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(index.rem_euclid(len as i64) as usize)
}
