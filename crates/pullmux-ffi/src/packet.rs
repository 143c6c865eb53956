use std::ffi::CString;
use std::ptr;

use pullmux_engine::{PacketRecord, StreamDescriptor};

use crate::types::{PmxPacket, PmxStream};

fn into_raw_bytes(bytes: &[u8]) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let boxed: Box<[u8]> = bytes.to_vec().into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed) as *mut u8, len)
}

/// # Safety
/// `data` must be null or a pointer produced by `into_raw_bytes` with `len`.
unsafe fn free_raw_bytes(data: *mut u8, len: usize) {
    if data.is_null() {
        return;
    }
    let slice_ptr = ptr::slice_from_raw_parts_mut(data, len);
    // SAFETY: `data` was allocated as a `Box<[u8]>` of `len` bytes by this library.
    unsafe {
        drop(Box::from_raw(slice_ptr));
    }
}

pub(crate) fn write_packet_out(out: &mut PmxPacket, record: &PacketRecord) {
    // SAFETY: Existing payload pointers are allocated by this library.
    unsafe { free_raw_bytes(out.data, out.len) };

    let (data, len) = into_raw_bytes(&record.payload);
    *out = PmxPacket {
        stream_index: record.stream_index,
        pts: record.pts,
        dts: record.dts,
        duration: record.duration,
        data,
        len,
    };
}

pub(crate) fn write_stream_out(out: &mut PmxStream, stream: &StreamDescriptor) {
    // SAFETY: Existing pointers are allocated by this library.
    unsafe { free_stream_fields(out) };

    let name = CString::new(stream.codec_name.replace('\0', "?")).unwrap_or_default();
    let (params, params_len) = into_raw_bytes(stream.codec_params.as_bytes());
    *out = PmxStream {
        index: stream.index,
        codec_id: stream.codec_id,
        codec_name: name.into_raw(),
        codec_params: params,
        codec_params_len: params_len,
    };
}

/// # Safety
/// Non-null pointers in `stream` must have been produced by `write_stream_out`.
unsafe fn free_stream_fields(stream: &mut PmxStream) {
    if !stream.codec_name.is_null() {
        // SAFETY: `codec_name` came from `CString::into_raw`.
        unsafe {
            drop(CString::from_raw(stream.codec_name));
        }
    }
    // SAFETY: Guaranteed by the caller.
    unsafe { free_raw_bytes(stream.codec_params, stream.codec_params_len) };
    *stream = PmxStream::default();
}

/// Free payload memory held by a [`PmxPacket`] populated by `pmx_context_read_packet`.
///
/// # Safety
/// `packet` must be either null or a valid pointer to a `PmxPacket` created by caller code.
/// If `packet->data` is non-null, it must have originated from this library.
#[no_mangle]
pub unsafe extern "C" fn pmx_packet_free(packet: *mut PmxPacket) {
    crate::ffi_boundary((), || {
        if packet.is_null() {
            return;
        }

        let packet_ref = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *packet }
        };

        // SAFETY: `data` was allocated by this library.
        unsafe { free_raw_bytes(packet_ref.data, packet_ref.len) };
        *packet_ref = PmxPacket::default();
    });
}

/// Free strings and parameter bytes held by a [`PmxStream`] populated by
/// `pmx_context_stream_at`.
///
/// # Safety
/// `stream` must be either null or a valid pointer to a `PmxStream` created by caller code
/// whose non-null fields originated from this library.
#[no_mangle]
pub unsafe extern "C" fn pmx_stream_free(stream: *mut PmxStream) {
    crate::ffi_boundary((), || {
        if stream.is_null() {
            return;
        }

        let stream_ref = {
            // SAFETY: Pointer validity is guaranteed by the caller.
            unsafe { &mut *stream }
        };
        // SAFETY: Fields were allocated by this library.
        unsafe { free_stream_fields(stream_ref) };
    });
}
