// Copyright © 2025 Nipun Kumar

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum InboundLine {
    Stdout(String),
    Stderr(String),
}

/// Newline-delimited JSON over a pair of byte streams.
///
/// Lines read from the peer's output (and, for child processes, its stderr)
/// are forwarded into one channel by background tasks; the channel closes
/// once every reader has hit end of stream.
pub struct LineTransport {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    pub rx_lines: Option<mpsc::UnboundedReceiver<InboundLine>>,
}

impl LineTransport {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::with_stderr(reader, writer, None::<tokio::io::Empty>)
    }

    pub fn with_stderr<R, W, E>(reader: R, writer: W, stderr: Option<E>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
        E: AsyncRead + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        // stdout reader
        let mut out_reader = BufReader::new(reader).lines();
        let tx_out = tx.clone();
        tokio::spawn(async move {
            while let Ok(Some(line)) = out_reader.next_line().await {
                if tx_out.send(InboundLine::Stdout(line)).is_err() {
                    break;
                }
            }
        });

        // stderr reader
        if let Some(stderr) = stderr {
            let mut err_reader = BufReader::new(stderr).lines();
            tokio::spawn(async move {
                while let Ok(Some(line)) = err_reader.next_line().await {
                    if tx.send(InboundLine::Stderr(line)).is_err() {
                        break;
                    }
                }
            });
        }

        Self {
            writer: Box::new(writer),
            rx_lines: Some(rx),
        }
    }

    pub async fn send_json<T: Serialize>(&mut self, v: &T) -> Result<()> {
        let mut s = serde_json::to_string(v)?;
        s.push('\n');
        self.writer
            .write_all(s.as_bytes())
            .await
            .context("writing to server stdin")?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn lines_flow_both_ways() {
        let (ours, theirs) = tokio::io::duplex(1024);
        let (our_read, our_write) = tokio::io::split(ours);
        let mut transport = LineTransport::new(our_read, our_write);
        let mut rx = transport.rx_lines.take().unwrap();

        let (their_read, mut their_write) = tokio::io::split(theirs);
        transport.send_json(&json!({"hello": 1})).await.unwrap();

        let mut lines = BufReader::new(their_read).lines();
        let got = lines.next_line().await.unwrap().unwrap();
        assert_eq!(got, r#"{"hello":1}"#);

        their_write.write_all(b"{\"back\":2}\n").await.unwrap();
        match rx.recv().await {
            Some(InboundLine::Stdout(s)) => assert_eq!(s, r#"{"back":2}"#),
            other => panic!("unexpected {other:?}"),
        }
    }
}
