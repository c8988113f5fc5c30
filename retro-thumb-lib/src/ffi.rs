//! C entry points for thumbnailer hosts that load this library dynamically.
//!
//! Both functions return 0 on success or a [`CreateError`] code.

use std::ffi::{CStr, c_char, c_int, c_uint};
use std::path::Path;
use std::sync::OnceLock;

use crate::create::Pipeline;
use crate::error::CreateError;

static PIPELINE: OnceLock<Pipeline> = OnceLock::new();

fn pipeline() -> &'static Pipeline {
    PIPELINE.get_or_init(Pipeline::system)
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: checked for null above; the caller guarantees termination.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Create a thumbnail of `source_file` (path or URI) at `output_file`.
///
/// # Safety
///
/// `source_file` and `output_file` must be null or point to NUL-terminated
/// UTF-8 strings that stay valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rp_create_thumbnail2(
    source_file: *const c_char,
    output_file: *const c_char,
    maximum_size: c_int,
    flags: c_uint,
) -> c_int {
    // SAFETY: forwarded from this function's contract.
    let Some(source) = (unsafe { c_str(source_file) }) else {
        return CreateError::source_file("invalid source path").code();
    };
    // SAFETY: as above.
    let Some(output) = (unsafe { c_str(output_file) }) else {
        return CreateError::output_file("invalid output path").code();
    };

    match pipeline().create_thumbnail(source, Path::new(output), maximum_size, flags) {
        Ok(_) => 0,
        Err(e) => {
            log::debug!("rp_create_thumbnail2: {source}: {e}");
            e.code()
        }
    }
}

/// [`rp_create_thumbnail2`] with no flags.
///
/// # Safety
///
/// Same requirements as [`rp_create_thumbnail2`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rp_create_thumbnail(
    source_file: *const c_char,
    output_file: *const c_char,
    maximum_size: c_int,
) -> c_int {
    // SAFETY: same contract.
    unsafe { rp_create_thumbnail2(source_file, output_file, maximum_size, 0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn null_arguments() {
        let path = CString::new("/tmp/out.png").unwrap();
        unsafe {
            assert_eq!(rp_create_thumbnail2(std::ptr::null(), path.as_ptr(), 128, 0), 3);
            assert_eq!(rp_create_thumbnail2(path.as_ptr(), std::ptr::null(), 128, 0), 6);
        }
    }

    #[test]
    fn rejects_unknown_flags_and_negative_size() {
        let source = CString::new("/nonexistent/rom.nds").unwrap();
        let output = CString::new("/nonexistent/out.png").unwrap();
        unsafe {
            assert_eq!(rp_create_thumbnail2(source.as_ptr(), output.as_ptr(), 128, 0x2), 9);
            assert_eq!(rp_create_thumbnail2(source.as_ptr(), output.as_ptr(), -1, 0), 2);
        }
    }
}
