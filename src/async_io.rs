//! Async byte source and sink adapters (feature = "async-io")
//!
//! Built on the `futures-io` traits, so any runtime works (tokio through
//! `tokio-util`'s compat layer, async-std, smol). Each function resolves
//! exactly once with a `Result` and never retries. The whole input is read
//! before the synchronous codec runs, so dropping a future part way through
//! only abandons the I/O; no codec call is ever interrupted.
//!
//! # Example
//!
//! ```no_run
//! use png_payload::{async_io, CodecOptions};
//!
//! async fn export<R, W>(rendered: R, download: W, code: &str) -> png_payload::Result<()>
//! where
//!     R: futures_io::AsyncRead + Unpin,
//!     W: futures_io::AsyncWrite + Unpin,
//! {
//!     async_io::embed_payload(rendered, download, code, CodecOptions::default()).await
//! }
//! ```

use crate::{error::Result, options::CodecOptions, png::Png};
use futures_io::{AsyncRead, AsyncWrite};
use futures_util::io::{AsyncReadExt, AsyncWriteExt};
use log::debug;

/// Read a complete PNG from `reader` and parse it
pub async fn read_png<R: AsyncRead + Unpin>(mut reader: R, options: CodecOptions) -> Result<Png> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    debug!("read {} bytes from async source", bytes.len());
    Png::parse_with_options(&bytes, options)
}

/// Serialize `png` and write it to `writer`
pub async fn write_png<W: AsyncWrite + Unpin>(png: &Png, mut writer: W) -> Result<()> {
    // Serialize up front so the codec step completes before any await
    let bytes = png.serialize();
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a PNG, embed `text` in its payload chunk and write the result
pub async fn embed_payload<R, W>(
    reader: R,
    writer: W,
    text: &str,
    options: CodecOptions,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut png = read_png(reader, options).await?;
    png.set_payload_chunk(text)?;
    write_png(&png, writer).await
}

/// Read a PNG and return its payload text, if any
pub async fn extract_payload<R: AsyncRead + Unpin>(
    reader: R,
    options: CodecOptions,
) -> Result<Option<String>> {
    read_png(reader, options).await?.payload_text()
}
