//! Terminal confirmation prompt

use async_trait::async_trait;
use cartsync::confirm::Confirm;
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tracing::warn;

/// Asks on stderr and reads the answer from stdin. Anything but yes declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

#[async_trait(?Send)]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        match ask(&mut io::stderr(), BufReader::new(io::stdin()), prompt).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!("could not ask for confirmation: {error}");

                false
            }
        }
    }
}

async fn ask<W, R>(out: &mut W, mut input: R, prompt: &str) -> io::Result<bool>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    out.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
    out.flush().await?;

    let mut answer = String::new();

    input.read_line(&mut answer).await?;

    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };

    use testresult::TestResult;

    use super::*;

    /// Accepts writes, fails every flush.
    struct Unflushable;

    impl AsyncWrite for Unflushable {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("stderr closed")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn only_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn prompt_is_written_before_reading_the_answer() -> TestResult {
        let mut out = Vec::new();

        assert!(ask(&mut out, b"yes\n".as_slice(), "Remove Rust 101?").await?);
        assert_eq!(String::from_utf8(out)?, "Remove Rust 101? [y/N] ");

        Ok(())
    }

    #[tokio::test]
    async fn failed_flush_is_reported() {
        let outcome = ask(&mut Unflushable, b"y\n".as_slice(), "Empty the cart?").await;

        assert!(outcome.is_err());
    }
}
