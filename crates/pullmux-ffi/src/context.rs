use pullmux_demux::{DemuxContext, ReadOutcome};
use pullmux_frame::FrameEngine;

use crate::args;
use crate::config;
use crate::error;
use crate::packet;
use crate::types::{ContextHandle, PmxContextHandle, PmxPacket, PmxResult, PmxStream};

fn with_context_mut<T>(
    handle: PmxContextHandle,
    on_error: T,
    f: impl FnOnce(&mut ContextHandle) -> T,
) -> T {
    if handle.is_null() {
        let _ = error::set_invalid_argument("context handle cannot be null");
        return on_error;
    }

    let context_handle = {
        // SAFETY: Pointer validity is guaranteed by the caller.
        unsafe { &mut *(handle as *mut ContextHandle) }
    };

    f(context_handle)
}

/// Create a demux context for the PMX container using the process-wide
/// configuration. Returns null on failure; see `pmx_last_error`.
#[no_mangle]
pub extern "C" fn pmx_context_create() -> PmxContextHandle {
    crate::ffi_boundary(std::ptr::null_mut(), || {
        error::clear_error_state();

        match DemuxContext::with_config(FrameEngine::new(), config::current()) {
            Ok(ctx) => Box::into_raw(Box::new(ContextHandle { ctx })) as PmxContextHandle,
            Err(err) => {
                let _ = error::map_demux_error(&err);
                std::ptr::null_mut()
            }
        }
    })
}

/// Buffer a chunk of input. A zero-length chunk signals end of input.
///
/// # Safety
/// `ctx` must be a valid context handle. If `len > 0`, `data` must be non-null and readable
/// for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_add_chunk(
    ctx: PmxContextHandle,
    data: *const u8,
    len: usize,
) -> PmxResult {
    crate::ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();

        let data = {
            // SAFETY: We validate pointer/length pairing in helper.
            match unsafe { args::bytes_arg(data, len, "data") } {
                Some(v) => v,
                None => return PmxResult::InvalidArgument,
            }
        };

        with_context_mut(ctx, PmxResult::InvalidArgument, |handle| {
            if data.is_empty() {
                handle.ctx.add_end_of_input();
                return PmxResult::Ok;
            }
            match handle.ctx.add_chunk(data) {
                Ok(()) => PmxResult::Ok,
                Err(err) => error::map_demux_error(&err),
            }
        })
    })
}

/// Signal that no more input will arrive.
///
/// # Safety
/// `ctx` must be a valid context handle.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_add_end_of_input(ctx: PmxContextHandle) -> PmxResult {
    crate::ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();
        with_context_mut(ctx, PmxResult::InvalidArgument, |handle| {
            handle.ctx.add_end_of_input();
            PmxResult::Ok
        })
    })
}

/// True once the container header has been identified.
///
/// # Safety
/// `ctx` must be a valid context handle.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_is_ready(ctx: PmxContextHandle) -> bool {
    crate::ffi_boundary(false, || {
        with_context_mut(ctx, false, |handle| handle.ctx.is_ready())
    })
}

/// Bytes the context wants before it can make progress.
///
/// # Safety
/// `ctx` must be a valid context handle.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_demand(ctx: PmxContextHandle) -> usize {
    crate::ffi_boundary(0, || with_context_mut(ctx, 0, |handle| handle.ctx.demand()))
}

/// Number of streams, probing first if needed.
///
/// # Safety
/// `ctx` must be a valid context handle and `out_count` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_stream_count(
    ctx: PmxContextHandle,
    out_count: *mut usize,
) -> PmxResult {
    crate::ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();

        let out_count = {
            // SAFETY: We validate null in helper.
            match unsafe { args::out_arg(out_count, "out_count") } {
                Some(v) => v,
                None => return PmxResult::InvalidArgument,
            }
        };

        with_context_mut(ctx, PmxResult::InvalidArgument, |handle| {
            match handle.ctx.streams() {
                Ok(streams) => {
                    *out_count = streams.len();
                    PmxResult::Ok
                }
                Err(err) => error::map_demux_error(&err),
            }
        })
    })
}

/// Copy the descriptor at position `position` into `out_stream`.
/// Release it with `pmx_stream_free`.
///
/// # Safety
/// `ctx` must be a valid context handle and `out_stream` must point to a `PmxStream` that is
/// zeroed or was previously filled by this library.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_stream_at(
    ctx: PmxContextHandle,
    position: usize,
    out_stream: *mut PmxStream,
) -> PmxResult {
    crate::ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();

        let out_stream = {
            // SAFETY: We validate null in helper.
            match unsafe { args::out_arg(out_stream, "out_stream") } {
                Some(v) => v,
                None => return PmxResult::InvalidArgument,
            }
        };

        with_context_mut(ctx, PmxResult::InvalidArgument, |handle| {
            let streams = match handle.ctx.streams() {
                Ok(streams) => streams,
                Err(err) => return error::map_demux_error(&err),
            };
            match streams.get(position) {
                Some(stream) => {
                    packet::write_stream_out(out_stream, stream);
                    PmxResult::Ok
                }
                None => error::set_invalid_argument(format!(
                    "stream position {position} out of range ({} streams)",
                    streams.len()
                )),
            }
        })
    })
}

/// Read the next packet.
///
/// Returns `PMX_OK` with `out_packet` filled, `PMX_DEMAND` with the wanted
/// byte count in `out_demand`, `PMX_EOF`, or an error code.
///
/// # Safety
/// `ctx` must be a valid context handle. `out_packet` must point to a `PmxPacket` that is
/// zeroed or was previously filled by this library. `out_demand` may be null.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_read_packet(
    ctx: PmxContextHandle,
    out_packet: *mut PmxPacket,
    out_demand: *mut usize,
) -> PmxResult {
    crate::ffi_boundary(PmxResult::Internal, || {
        error::clear_error_state();

        let out_packet = {
            // SAFETY: We validate null in helper.
            match unsafe { args::out_arg(out_packet, "out_packet") } {
                Some(v) => v,
                None => return PmxResult::InvalidArgument,
            }
        };

        with_context_mut(ctx, PmxResult::InvalidArgument, |handle| {
            match handle.ctx.read_packet() {
                ReadOutcome::Packet(record) => {
                    packet::write_packet_out(out_packet, &record);
                    PmxResult::Ok
                }
                ReadOutcome::Demand(want) => {
                    if !out_demand.is_null() {
                        // SAFETY: Non-null and caller guarantees validity.
                        unsafe { *out_demand = want };
                    }
                    PmxResult::Demand
                }
                ReadOutcome::Eof => PmxResult::Eof,
                ReadOutcome::Error(err) => error::map_demux_error(&err),
            }
        })
    })
}

/// Destroy a context, closing the engine handle before freeing buffers.
///
/// # Safety
/// `ctx` must be null or a handle previously returned by `pmx_context_create`, and must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn pmx_context_destroy(ctx: PmxContextHandle) {
    crate::ffi_boundary((), || {
        if ctx.is_null() {
            return;
        }

        // SAFETY: Caller guarantees this handle was allocated by pmx_context_create.
        let handle = unsafe { Box::from_raw(ctx as *mut ContextHandle) };
        handle.ctx.destroy();
    });
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use pullmux_frame::codec_id::{AAC, H264};
    use pullmux_frame::{ContainerWriter, Packet, StreamEntry};

    use super::*;

    fn sample(packets: usize) -> Vec<u8> {
        let mut writer = ContainerWriter::new(Vec::new());
        writer
            .write_header(
                &[
                    StreamEntry::new(0, H264, vec![1u8, 2, 3]),
                    StreamEntry::new(1, AAC, Vec::new()),
                ],
                0,
            )
            .unwrap();
        for i in 0..packets {
            writer
                .write_packet(&Packet::new((i % 2) as u16, i as i64, 1, vec![i as u8; 10 + i]))
                .unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn null_context_is_invalid_argument() {
        // SAFETY: Null handles are rejected before use.
        unsafe {
            assert_eq!(
                pmx_context_add_end_of_input(std::ptr::null_mut()),
                PmxResult::InvalidArgument
            );
            assert!(!pmx_context_is_ready(std::ptr::null_mut()));
            assert_eq!(pmx_context_demand(std::ptr::null_mut()), 0);
            pmx_context_destroy(std::ptr::null_mut());
        }
    }

    #[test]
    fn read_before_input_reports_demand() {
        let ctx = pmx_context_create();
        assert!(!ctx.is_null());

        let mut packet = PmxPacket::default();
        let mut demand = 0usize;
        // SAFETY: ctx is live and out params are valid.
        unsafe {
            assert_eq!(
                pmx_context_read_packet(ctx, &mut packet, &mut demand),
                PmxResult::Demand
            );
            assert_eq!(demand, pmx_context_demand(ctx));
            assert!(demand > 0);
            pmx_context_destroy(ctx);
        }
    }

    #[test]
    fn streams_and_packets_through_c_abi() {
        let bytes = sample(6);
        let ctx = pmx_context_create();

        // SAFETY: ctx is live for the whole block and every pointer is valid.
        unsafe {
            assert_eq!(
                pmx_context_add_chunk(ctx, bytes.as_ptr(), bytes.len()),
                PmxResult::Ok
            );

            let mut count = 0usize;
            assert_eq!(pmx_context_stream_count(ctx, &mut count), PmxResult::Ok);
            assert_eq!(count, 2);
            assert!(pmx_context_is_ready(ctx));

            let mut stream = PmxStream::default();
            assert_eq!(pmx_context_stream_at(ctx, 0, &mut stream), PmxResult::Ok);
            assert_eq!(CStr::from_ptr(stream.codec_name).to_str().unwrap(), "h264");
            assert_eq!(stream.codec_params_len, 3);
            assert_eq!(pmx_context_stream_at(ctx, 1, &mut stream), PmxResult::Ok);
            assert_eq!(CStr::from_ptr(stream.codec_name).to_str().unwrap(), "aac");
            assert_eq!(
                pmx_context_stream_at(ctx, 2, &mut stream),
                PmxResult::InvalidArgument
            );
            crate::packet::pmx_stream_free(&mut stream);

            // Zero-length chunk is end of input.
            assert_eq!(
                pmx_context_add_chunk(ctx, std::ptr::null(), 0),
                PmxResult::Ok
            );

            let mut packet = PmxPacket::default();
            for i in 0..6 {
                assert_eq!(
                    pmx_context_read_packet(ctx, &mut packet, std::ptr::null_mut()),
                    PmxResult::Ok
                );
                assert_eq!(packet.stream_index, (i % 2) as u32);
                assert_eq!(packet.pts, i as i64);
                assert_eq!(packet.len, 10 + i);
            }
            crate::packet::pmx_packet_free(&mut packet);

            assert_eq!(
                pmx_context_read_packet(ctx, &mut packet, std::ptr::null_mut()),
                PmxResult::Eof
            );
            assert_eq!(
                pmx_context_read_packet(ctx, &mut packet, std::ptr::null_mut()),
                PmxResult::Eof
            );
            pmx_context_destroy(ctx);
        }
    }

    #[test]
    fn foreign_bytes_report_malformed_input() {
        let ctx = pmx_context_create();
        let bytes = vec![0xAAu8; 64];

        // SAFETY: ctx is live and pointers are valid.
        unsafe {
            assert_eq!(
                pmx_context_add_chunk(ctx, bytes.as_ptr(), bytes.len()),
                PmxResult::Ok
            );
            let mut count = 0usize;
            assert_eq!(
                pmx_context_stream_count(ctx, &mut count),
                PmxResult::MalformedInput
            );
            let message = CStr::from_ptr(crate::pmx_last_error()).to_str().unwrap();
            assert!(message.starts_with("malformed input"));
            pmx_context_destroy(ctx);
        }
    }
}
