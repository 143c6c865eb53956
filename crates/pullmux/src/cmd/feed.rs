use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use pullmux_demux::DemuxContext;
use pullmux_frame::FrameEngine;
use tracing::debug;

use crate::exit::{demux_error, io_error, CliError, CliResult, USAGE};

/// Feeds a file into a demux context in chunks sized by its demand.
pub struct FileFeeder {
    path: PathBuf,
    file: File,
    buf: Vec<u8>,
    fed: u64,
    done: bool,
}

impl FileFeeder {
    pub fn open(path: &Path, chunk_size: usize) -> CliResult<Self> {
        if chunk_size == 0 {
            return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
        }
        let file = File::open(path)
            .map_err(|err| io_error(&format!("open {}", path.display()), err))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            buf: vec![0u8; chunk_size],
            fed: 0,
            done: false,
        })
    }

    /// Total bytes handed to the context.
    pub fn fed(&self) -> u64 {
        self.fed
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed at most `want` bytes (at least one read is attempted). Signals
    /// end of input once the file is exhausted.
    pub fn feed(&mut self, ctx: &mut DemuxContext<FrameEngine>, want: usize) -> CliResult<()> {
        if self.done {
            ctx.add_end_of_input();
            return Ok(());
        }

        let take = want.clamp(1, self.buf.len());
        let read = loop {
            match self.file.read(&mut self.buf[..take]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(io_error(&format!("read {}", self.path.display()), err));
                }
            }
        };

        if read == 0 {
            debug!(fed = self.fed, "input file exhausted");
            self.done = true;
            ctx.add_end_of_input();
            return Ok(());
        }

        self.fed += read as u64;
        ctx.add_chunk(&self.buf[..read])
            .map_err(|err| demux_error(&self.path.display().to_string(), err))
    }

    pub fn context_label(&self) -> String {
        self.path.display().to_string()
    }
}

/// Feed until the header is known (or the file ends), then return the
/// number of streams.
pub fn probe_streams(
    feeder: &mut FileFeeder,
    ctx: &mut DemuxContext<FrameEngine>,
) -> CliResult<usize> {
    while !ctx.is_ready() && !feeder.is_done() {
        let want = ctx.demand();
        feeder.feed(ctx, want)?;
    }
    ctx.streams()
        .map(|streams| streams.len())
        .map_err(|err| demux_error(&feeder.context_label(), err))
}
