use crate::error;

/// Convert an optional pointer + length pair into a byte slice.
///
/// # Safety
/// If `len > 0`, `data` must be non-null and readable for `len` bytes for
/// the duration of the call.
pub(crate) unsafe fn bytes_arg<'a>(data: *const u8, len: usize, name: &str) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null when len > 0"));
        return None;
    }

    // SAFETY: Pointer and length are validated above and owned by caller for the call duration.
    Some(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Borrow a caller-provided out parameter.
///
/// # Safety
/// `out` must be null or valid for writes for the duration of the call.
pub(crate) unsafe fn out_arg<'a, T>(out: *mut T, name: &str) -> Option<&'a mut T> {
    if out.is_null() {
        let _ = error::set_invalid_argument(format!("{name} cannot be null"));
        return None;
    }
    // SAFETY: Non-null and caller guarantees validity.
    Some(unsafe { &mut *out })
}
