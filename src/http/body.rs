//! Response body types
//!
//! A single body type covers every response the server emits: small
//! generated pages (error text, directory listings) are sent whole, file
//! transfers are streamed from disk in bounded chunks. Full-content and
//! partial-content transfers share the same chunked path, so a large file
//! is never buffered in memory regardless of whether a range was asked
//! for.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::body::{Body, Frame, SizeHint};
use pin_project::pin_project;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

/// Fixed read granularity for file transfers.
pub const CHUNK_SIZE: usize = 8192;

/// Body of every response the server produces.
#[pin_project(project = ResponseBodyProj)]
pub enum ResponseBody {
    /// In-memory payload, written in one frame.
    Bytes(#[pin] Full<Bytes>),
    /// Byte window streamed from an open file.
    File(#[pin] FileWindow),
}

impl ResponseBody {
    /// Empty body, for HEAD responses and bodiless statuses.
    pub fn empty() -> Self {
        Self::Bytes(Full::new(Bytes::new()))
    }

    /// Whole in-memory payload.
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self::Bytes(Full::new(data.into()))
    }

    /// Stream `len` bytes of `file` starting at byte offset `start`.
    pub const fn window(file: File, start: u64, len: u64) -> Self {
        Self::File(FileWindow::new(file, start, len))
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<io::Result<Frame<Bytes>>>> {
        match self.project() {
            ResponseBodyProj::Bytes(full) => full
                .poll_frame(cx)
                .map(|opt| opt.map(|res| res.map_err(|never| match never {}))),
            ResponseBodyProj::File(window) => window.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Bytes(full) => full.is_end_stream(),
            Self::File(window) => window.remaining == 0,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Bytes(full) => full.size_hint(),
            Self::File(window) => SizeHint::with_exact(window.remaining),
        }
    }
}

/// Streaming byte window over an open file.
///
/// Seeks to the window start once, then reads forward in [`CHUNK_SIZE`]
/// pieces until the window is exhausted. Offsets are strictly increasing;
/// nothing beyond the window is read. If the connection is dropped
/// mid-stream, the body is dropped with it and the file handle closes.
#[pin_project]
pub struct FileWindow {
    #[pin]
    file: File,
    state: WindowState,
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowState {
    /// Seek to the window start has not been issued yet.
    Seek { offset: u64 },
    /// Seek issued, waiting for completion.
    Seeking,
    /// Positioned inside the window, reading forward.
    Reading,
}

impl FileWindow {
    const fn new(file: File, start: u64, len: u64) -> Self {
        Self {
            file,
            state: WindowState::Seek { offset: start },
            remaining: len,
        }
    }

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<io::Result<Frame<Bytes>>>> {
        let mut this = self.project();

        if let WindowState::Seek { offset } = *this.state {
            if let Err(e) = this.file.as_mut().start_seek(SeekFrom::Start(offset)) {
                return Poll::Ready(Some(Err(e)));
            }
            *this.state = WindowState::Seeking;
        }

        if *this.state == WindowState::Seeking {
            match this.file.as_mut().poll_complete(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(Ok(_)) => *this.state = WindowState::Reading,
            }
        }

        if *this.remaining == 0 {
            return Poll::Ready(None);
        }

        let want = usize::try_from(*this.remaining)
            .unwrap_or(usize::MAX)
            .min(CHUNK_SIZE);
        let mut buf = BytesMut::zeroed(want);
        let mut read_buf = ReadBuf::new(&mut buf);

        match this.file.as_mut().poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => match read_buf.filled().len() {
                // The resource shrank under us; the framed length can no
                // longer be honored.
                0 => Poll::Ready(Some(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "file ended before the byte window was fully read",
                )))),
                n => {
                    buf.truncate(n);
                    *this.remaining -= n as u64;
                    Poll::Ready(Some(Ok(Frame::data(buf.freeze()))))
                }
            },
        }
    }
}
