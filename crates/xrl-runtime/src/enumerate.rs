//! The two-call enumeration convention.
//!
//! Callers first pass `capacity_input == 0` to learn the element count, then
//! call again with a buffer of at least that many elements.

use xrl_abi::{copy_str_to_chars, ExtensionProperties, XrResult};

/// Answer one call of a count-then-fill enumeration over `items`.
///
/// `write` copies one item into a caller-provided slot; it should leave the
/// slot's structure header alone.
///
/// # Safety
///
/// `count_output` must be null or writable. When `capacity_input` is non-zero,
/// `out` must be null or point to `capacity_input` writable elements.
pub unsafe fn fill_two_call<S, T>(
    items: &[S],
    capacity_input: u32,
    count_output: *mut u32,
    out: *mut T,
    mut write: impl FnMut(&mut T, &S),
) -> XrResult {
    if count_output.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    *count_output = items.len() as u32;
    if capacity_input == 0 {
        return XrResult::SUCCESS;
    }
    if (capacity_input as usize) < items.len() {
        return XrResult::ERROR_SIZE_INSUFFICIENT;
    }
    if out.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    let slots = std::slice::from_raw_parts_mut(out, items.len());
    for (slot, item) in slots.iter_mut().zip(items) {
        write(slot, item);
    }
    XrResult::SUCCESS
}

/// [`fill_two_call`] specialised for `(name, version)` extension lists.
///
/// # Safety
///
/// Same contract as [`fill_two_call`].
pub unsafe fn fill_extension_properties(
    extensions: &[(&str, u32)],
    capacity_input: u32,
    count_output: *mut u32,
    out: *mut ExtensionProperties,
) -> XrResult {
    fill_two_call(extensions, capacity_input, count_output, out, |slot, (name, version)| {
        copy_str_to_chars(&mut slot.extension_name, name);
        slot.extension_version = *version;
    })
}
