use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Appends every chunk read from `reader` until EOF, byte for byte.
pub(super) async fn read_stream_capture<R: AsyncRead + Unpin>(
    mut reader: R,
) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    Ok(buffer)
}
