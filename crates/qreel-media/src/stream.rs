//! Streaming a scratch file as a response body.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::fs::File;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::scratch::ScratchFile;

// 64KiB chunks
const STREAM_CAPACITY: usize = 64 * 1024;

pin_project! {
    /// Byte stream over a scratch file that owns the file.
    ///
    /// The file is released on end of stream, on the first read error, or
    /// when the stream is dropped before completion (client went away).
    #[derive(Debug)]
    pub struct ScratchFileStream<R> {
        #[pin]
        reader: ReaderStream<R>,
        file: ScratchFile,
        len: u64,
    }
}

impl ScratchFileStream<File> {
    /// Open the scratch file for streaming.
    ///
    /// On failure the scratch file is dropped, which removes it.
    pub async fn open(file: ScratchFile) -> io::Result<Self> {
        let handle = File::open(file.path()).await?;
        let len = handle.metadata().await?.len();
        Ok(Self::with_reader(file, handle, len))
    }
}

impl<R: AsyncRead> ScratchFileStream<R> {
    /// Stream `reader` as the contents of `file`, which is released with the stream.
    pub fn with_reader(file: ScratchFile, reader: R, len: u64) -> Self {
        Self {
            reader: ReaderStream::with_capacity(reader, STREAM_CAPACITY),
            file,
            len,
        }
    }

    /// File size in bytes at open time.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<R: AsyncRead> Stream for ScratchFileStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.reader.poll_next(cx) {
            Poll::Ready(None) => {
                debug!(path = %this.file.path().display(), "Scratch file stream completed");
                this.file.release();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                error!(path = %this.file.path().display(), "Scratch file stream error: {}", e);
                this.file.release();
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}
