use std::ffi::c_void;
use std::os::raw::c_char;

use pullmux_demux::DemuxContext;
use pullmux_frame::FrameEngine;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmxResult {
    Ok = 0,
    InvalidArgument = 1,
    NotReady = 2,
    ProbeSizeExceeded = 3,
    MalformedInput = 4,
    ReadError = 5,
    Failed = 6,
    Demand = 7,
    Eof = 8,
    Internal = 99,
}

#[allow(dead_code)]
pub const PMX_OK: PmxResult = PmxResult::Ok;
#[allow(dead_code)]
pub const PMX_ERR_INVALID_ARGUMENT: PmxResult = PmxResult::InvalidArgument;
#[allow(dead_code)]
pub const PMX_ERR_NOT_READY: PmxResult = PmxResult::NotReady;
#[allow(dead_code)]
pub const PMX_ERR_PROBE_SIZE_EXCEEDED: PmxResult = PmxResult::ProbeSizeExceeded;
#[allow(dead_code)]
pub const PMX_ERR_MALFORMED_INPUT: PmxResult = PmxResult::MalformedInput;
#[allow(dead_code)]
pub const PMX_ERR_READ: PmxResult = PmxResult::ReadError;
#[allow(dead_code)]
pub const PMX_ERR_FAILED: PmxResult = PmxResult::Failed;
#[allow(dead_code)]
pub const PMX_DEMAND: PmxResult = PmxResult::Demand;
#[allow(dead_code)]
pub const PMX_EOF: PmxResult = PmxResult::Eof;
#[allow(dead_code)]
pub const PMX_ERR_INTERNAL: PmxResult = PmxResult::Internal;

/// One demuxed packet. `data` is owned by this library; release it with
/// `pmx_packet_free`.
#[repr(C)]
#[derive(Debug)]
pub struct PmxPacket {
    pub stream_index: u32,
    pub pts: i64,
    pub dts: i64,
    pub duration: i64,
    pub data: *mut u8,
    pub len: usize,
}

impl Default for PmxPacket {
    fn default() -> Self {
        Self {
            stream_index: 0,
            pts: 0,
            dts: 0,
            duration: 0,
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// One stream descriptor. `codec_name` and `codec_params` are owned by this
/// library; release them with `pmx_stream_free`.
#[repr(C)]
#[derive(Debug)]
pub struct PmxStream {
    pub index: u32,
    pub codec_id: u32,
    pub codec_name: *mut c_char,
    pub codec_params: *mut u8,
    pub codec_params_len: usize,
}

impl Default for PmxStream {
    fn default() -> Self {
        Self {
            index: 0,
            codec_id: 0,
            codec_name: std::ptr::null_mut(),
            codec_params: std::ptr::null_mut(),
            codec_params_len: 0,
        }
    }
}

pub type PmxContextHandle = *mut c_void;

pub(crate) struct ContextHandle {
    pub(crate) ctx: DemuxContext<FrameEngine>,
}
