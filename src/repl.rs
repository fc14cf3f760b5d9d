//! Interactive chat loop on top of a [`DispatchLoop`].

use std::future::Future;
use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::dispatch::{DispatchError, DispatchLoop};

const SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Quit,
    Empty,
    Query(&'a str),
}

pub fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else {
        Input::Query(line)
    }
}

/// Prints the banner and tips for the dispatcher's toolset.
pub fn print_banner(dispatch: &DispatchLoop, out: &mut impl Write) -> Result<()> {
    let toolset = dispatch.toolset();
    writeln!(out, "\n{}", toolset.banner())?;
    for tip in toolset.tips() {
        writeln!(out, "💡 TIP: {tip}")?;
    }
    Ok(())
}

/// Reads queries from `input` until quit, EOF or Ctrl-C at the prompt.
///
/// A Ctrl-C while a turn is running abandons that turn only. Fails when the
/// tool server has gone away.
pub async fn run<R>(dispatch: &DispatchLoop, input: R, out: &mut impl Write) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    run_with_interrupt(dispatch, input, out, || async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// [`run`] with the interrupt source supplied by the caller. `interrupt` is
/// called afresh for every prompt and every turn.
pub async fn run_with_interrupt<R, I, F>(
    dispatch: &DispatchLoop,
    input: R,
    out: &mut impl Write,
    mut interrupt: I,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    I: FnMut() -> F,
    F: Future<Output = ()>,
{
    let prompt = dispatch.toolset().repl_prompt();
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut lines = input.lines();

    loop {
        write!(out, "\n{prompt}")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupt() => {
                writeln!(out)?;
                info!("interrupted at prompt");
                None
            }
        };
        let Some(line) = line else {
            debug!("input closed");
            break;
        };

        let query = match classify(&line) {
            Input::Quit => break,
            Input::Empty => {
                writeln!(out, "❓ Please enter a query or type 'help' for examples.")?;
                continue;
            }
            Input::Query(q) => q,
        };

        tokio::select! {
            turn = dispatch.run_turn(query) => match turn {
                Ok(turn) => {
                    debug!(outcome = ?turn.outcome, "turn finished");
                    writeln!(out, "\n{separator}\n{}\n{separator}", turn.final_text)?;
                }
                Err(DispatchError::Disconnected) => {
                    writeln!(out, "\n❌ The tool server has exited; ending the session.")?;
                    return Err(DispatchError::Disconnected.into());
                }
                Err(e) => writeln!(out, "\n⚠️ Error processing query: {e}")?,
            },
            _ = interrupt() => {
                writeln!(out, "\n⏹️ Query interrupted.")?;
            }
        }
    }

    writeln!(out, "\n👋 Goodbye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::llm::{GenerationConfig, Oracle};
    use crate::registry::{Arguments, ToolRegistry};
    use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
    use crate::toolset::Generic;

    struct Echo;

    #[async_trait::async_trait]
    impl Oracle for Echo {
        async fn complete(&self, _prompt: &str, _config: &GenerationConfig) -> anyhow::Result<String> {
            Ok("plain answer".to_string())
        }
    }

    fn dispatcher() -> DispatchLoop {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("echo", "Echo text")
                    .param(ParamSpec::required("text", ParamType::String)),
                |args: Arguments| async move { anyhow::Ok(json!(args.string("text")?)) },
            )
            .unwrap();
        DispatchLoop::new(Arc::new(registry), Arc::new(Echo), Box::new(Generic))
    }

    /// Hangs on its first completion until interrupted, then answers.
    struct StallsOnce {
        calls: AtomicUsize,
        started: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl Oracle for StallsOnce {
        async fn complete(&self, _prompt: &str, _config: &GenerationConfig) -> anyhow::Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                std::future::pending::<()>().await;
            }
            Ok("second answer".to_string())
        }
    }

    #[test]
    fn quit_words_and_blanks() {
        assert_eq!(classify("  quit "), Input::Quit);
        assert_eq!(classify("EXIT"), Input::Quit);
        assert_eq!(classify("   "), Input::Empty);
        assert_eq!(classify(" add 2 and 3 "), Input::Query("add 2 and 3"));
    }

    #[tokio::test]
    async fn answers_until_quit() {
        let dispatch = dispatcher();
        let input: &[u8] = b"\nwhat is up\nquit\nnever read\n";
        let mut out = Vec::new();
        run(&dispatch, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Please enter a query"));
        assert_eq!(text.matches("plain answer").count(), 1);
        assert!(text.ends_with("👋 Goodbye!\n"));
    }

    #[tokio::test]
    async fn end_of_input_exits() {
        let dispatch = dispatcher();
        let input: &[u8] = b"";
        let mut out = Vec::new();
        run(&dispatch, input, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Goodbye"));
    }

    #[tokio::test]
    async fn interrupted_turn_leaves_the_session_usable() {
        let started = Arc::new(Notify::new());
        let oracle = Arc::new(StallsOnce {
            calls: AtomicUsize::new(0),
            started: started.clone(),
        });
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new("noop", "Does nothing"), |_args: Arguments| async move {
                anyhow::Ok(json!(null))
            })
            .unwrap();
        let dispatch = DispatchLoop::new(Arc::new(registry), oracle, Box::new(Generic));

        let input: &[u8] = b"first question\nsecond question\n";
        let mut out = Vec::new();
        run_with_interrupt(&dispatch, input, &mut out, || {
            let started = started.clone();
            async move { started.notified().await }
        })
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Query interrupted"), "{text}");
        assert!(text.contains("second answer"), "{text}");
        assert!(text.ends_with("👋 Goodbye!\n"));
    }

    struct Gone;

    #[async_trait::async_trait]
    impl crate::mcp::ToolHost for Gone {
        async fn list_tools(&self) -> anyhow::Result<Vec<ToolDescriptor>> {
            Ok(vec![])
        }

        async fn call_tool(
            &self,
            _name: &str,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> crate::mcp::ToolResult {
            crate::mcp::ToolResult::failure("gone")
        }

        fn is_connected(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn exited_server_ends_the_session() {
        let dispatch = DispatchLoop::new(Arc::new(Gone), Arc::new(Echo), Box::new(Generic));
        let input: &[u8] = b"anything\nnever asked\n";
        let mut out = Vec::new();
        let err = run_with_interrupt(&dispatch, input, &mut out, std::future::pending::<()>)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no longer running"));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("tool server has exited"));
        assert!(!text.contains("plain answer"));
    }
}
