//! pullmux-ffi: C-ABI exports for the pullmux demux context.
//!
//! Contexts created here demux the PMX reference container. Buffer sizing is
//! process-wide and read once from the environment by [`pmx_init`].

mod args;
mod config;
mod context;
mod error;
mod packet;
mod types;

use std::panic::AssertUnwindSafe;

pub use context::{
    pmx_context_add_chunk, pmx_context_add_end_of_input, pmx_context_create,
    pmx_context_demand, pmx_context_destroy, pmx_context_is_ready, pmx_context_read_packet,
    pmx_context_stream_at, pmx_context_stream_count,
};
pub use packet::{pmx_packet_free, pmx_stream_free};
pub use types::{
    PmxContextHandle, PmxPacket, PmxResult, PmxStream, PMX_DEMAND, PMX_EOF, PMX_ERR_FAILED,
    PMX_ERR_INTERNAL, PMX_ERR_INVALID_ARGUMENT, PMX_ERR_MALFORMED_INPUT, PMX_ERR_NOT_READY,
    PMX_ERR_PROBE_SIZE_EXCEEDED, PMX_ERR_READ, PMX_OK,
};

fn ffi_boundary<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error::set_panic_error();
            on_panic
        }
    }
}

/// Load process-wide configuration from `PULLMUX_INITIAL_CAPACITY` and
/// `PULLMUX_MAX_PROBE_SIZE`. Only the first call reads the environment.
#[no_mangle]
pub extern "C" fn pmx_init() -> PmxResult {
    ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();
        match config::init_from_env() {
            Ok(_) => PmxResult::Ok,
            Err(message) => error::set_invalid_argument(message),
        }
    })
}

#[no_mangle]
pub extern "C" fn pmx_cleanup() {
    ffi_boundary((), || {
        error::clear_error_state();
    });
}

#[no_mangle]
pub extern "C" fn pmx_last_error() -> *const std::os::raw::c_char {
    ffi_boundary(std::ptr::null(), error::last_error_ptr)
}
