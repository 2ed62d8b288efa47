//! Interactive REPL loop: prompt, read a line, stream the reply, repeat until `exit` or EOF.

use std::io::Write;

use bxlchat::{AgentError, ChatSession, MessageChunk};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::Instrument;

pub const GREETING: &str = "🤖 : Your command is my wish, sir! (or type 'exit' to quit)";
pub const PROMPT: &str = "😎 : ";
pub const REPLY_PREFIX: &str = "🤖 :";
pub const FAREWELL: &str = "🤖 : Goodbye!";

/// Streamed fragments buffered between the model and the console.
const CHUNK_BUFFER: usize = 128;

/// `exit`, ignoring surrounding whitespace and case.
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Runs the loop until `exit` or EOF. A failed turn is reported on stderr and the loop goes on.
pub async fn run_repl_loop<R, W>(
    session: &mut ChatSession,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut turn = 0u64;

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            writeln!(out, "{}", FAREWELL)?;
            break;
        };
        if is_exit_command(&line) {
            writeln!(out, "{}", FAREWELL)?;
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        turn += 1;
        let span = tracing::info_span!("turn", n = turn);
        if let Err(e) = run_turn(session, &line, out).instrument(span).await? {
            eprintln!("error: {}", e);
        }
    }
    Ok(())
}

/// Sends one message and prints the reply as it streams in.
///
/// The outer error is a console write failure; the inner one is the chat error.
async fn run_turn<W: Write>(
    session: &mut ChatSession,
    line: &str,
    out: &mut W,
) -> std::io::Result<Result<String, AgentError>> {
    let (tx, mut rx) = mpsc::channel::<MessageChunk>(CHUNK_BUFFER);

    let print = async {
        let mut printed = false;
        while let Some(chunk) = rx.recv().await {
            if chunk.content.is_empty() {
                continue;
            }
            if !printed {
                writeln!(out, "{}", REPLY_PREFIX)?;
                printed = true;
            }
            write!(out, "{}", chunk.content)?;
            out.flush()?;
        }
        Ok::<_, std::io::Error>(printed)
    };

    let (result, printed) = tokio::join!(session.send(line, Some(tx)), print);
    let printed = printed?;

    if let Ok(reply) = &result {
        if !printed && !reply.is_empty() {
            writeln!(out, "{}", REPLY_PREFIX)?;
            write!(out, "{}", reply)?;
        }
        writeln!(out)?;
    } else if printed {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bxlchat::{LlmResponse, Message, MockLlm, ToolRegistry};

    fn session(llm: MockLlm) -> ChatSession {
        ChatSession::with_system_prompt(Arc::new(llm), Arc::new(ToolRegistry::new()), "sys")
    }

    #[test]
    fn exit_command_ignores_case_and_whitespace() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  EXIT \t"));
        assert!(is_exit_command("Exit"));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("quit"));
        assert!(!is_exit_command(""));
    }

    #[tokio::test]
    async fn streams_reply_then_exits() {
        let mut session = session(MockLlm::with_no_tool_calls("hello there").with_stream_by_char());
        let mut out = Vec::new();
        run_repl_loop(&mut session, "hi\n\n  \nexit\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("😎 : 🤖 :\nhello there\n"), "{}", out);
        assert!(out.ends_with("🤖 : Goodbye!\n"), "{}", out);
        // Blank lines are not sent.
        assert_eq!(
            session.history(),
            &[
                Message::system("sys"),
                Message::user("hi"),
                Message::assistant("hello there"),
            ]
        );
    }

    #[tokio::test]
    async fn eof_says_goodbye() {
        let mut session = session(MockLlm::with_no_tool_calls("unused"));
        let mut out = Vec::new();
        run_repl_loop(&mut session, "".as_bytes(), &mut out)
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "😎 : \n🤖 : Goodbye!\n");
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn failed_turn_keeps_loop_running() {
        let llm = MockLlm::scripted(vec![LlmResponse {
            tool_calls: vec![bxlchat::ToolCall {
                name: "nope".into(),
                arguments: "{}".into(),
                id: Some("c".into()),
            }],
            ..Default::default()
        }]);
        let mut session = session(llm).with_max_tool_rounds(1);
        let mut out = Vec::new();
        run_repl_loop(&mut session, "first\nsecond\nexit\n".as_bytes(), &mut out)
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("🤖 : Goodbye!\n"), "{}", out);
        let users = session
            .history()
            .iter()
            .filter(|m| matches!(m, Message::User(_)))
            .count();
        assert_eq!(users, 2);
    }
}
