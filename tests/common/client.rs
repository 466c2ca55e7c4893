//! Test client.
//!
//! Sends raw lines and parses everything the server writes back.

use microirc_proto::Message;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A line-oriented client connected to a test server.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    nick: String,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str, nick: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            nick: nick.to_string(),
        })
    }

    /// The nickname this client registers with.
    #[allow(dead_code)]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Send a raw line, appending CRLF if missing.
    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one message, waiting up to five seconds.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive one message with a custom timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("connection closed");
        }
        let msg = line.trim_end_matches(['\r', '\n']).parse::<Message>()?;
        Ok(msg)
    }

    /// Receive messages until one satisfies `pred`, returning everything seen.
    pub async fn recv_until<F>(&mut self, mut pred: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut seen = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = pred(&msg);
            seen.push(msg);
            if done {
                return Ok(seen);
            }
        }
    }

    /// Receive until a message with the given verb arrives.
    #[allow(dead_code)]
    pub async fn expect_verb(&mut self, verb: &str) -> anyhow::Result<Message> {
        let mut seen = self.recv_until(|m| m.verb == verb).await?;
        seen.pop()
            .ok_or_else(|| anyhow::anyhow!("no {verb} received"))
    }

    /// Register with NICK/USER and wait for the end of the welcome burst.
    pub async fn register(&mut self) -> anyhow::Result<Vec<Message>> {
        let nick = self.nick.clone();
        self.send_raw(&format!("NICK {nick}")).await?;
        self.send_raw(&format!("USER {nick} 0 * :{nick}")).await?;
        self.recv_until(|m| m.verb == "005").await
    }

    /// Send QUIT and wait for the closing ERROR line.
    #[allow(dead_code)]
    pub async fn quit(&mut self, reason: Option<&str>) -> anyhow::Result<Message> {
        match reason {
            Some(r) => self.send_raw(&format!("QUIT :{r}")).await?,
            None => self.send_raw("QUIT").await?,
        }
        self.expect_verb("ERROR").await
    }
}
