use std::io::{self, BufRead, Write};

use chat_provider::{ChatProvider, ExchangeError};
use tracing::warn;

use crate::persist::Persistence;

pub const PROMPT: &str = "human\t  => ";

/// Why the read-exchange loop stopped.
#[derive(Debug)]
pub enum LoopEnd {
    EndOfInput,
    ReadFailed(io::Error),
    ExchangeFailed(ExchangeError),
}

/// Reads one user turn per line from `input` until end of input, printing
/// each reply as `<role> => <content>`.
///
/// The session lock is only taken to append turns. The exchange runs on an
/// unlocked copy of the session so an interrupt can save while a request is
/// in flight.
///
/// Errors writing to `output` are returned; every other ending is a
/// [`LoopEnd`].
pub fn run<R, W>(
    mut input: R,
    output: &mut W,
    persistence: &Persistence,
    provider: &dyn ChatProvider,
) -> io::Result<LoopEnd>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                writeln!(output)?;
                return Ok(LoopEnd::EndOfInput);
            }
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "failed to read input; ending session");
                return Ok(LoopEnd::ReadFailed(error));
            }
        }

        let mut pending = {
            let mut session = persistence.session();
            session.append_user_turn(trim_line_ending(&line));
            session.clone()
        };

        let reply = match pending.exchange(provider) {
            Ok(reply) => reply.clone(),
            Err(error) => {
                warn!(%error, "exchange failed; ending session");
                return Ok(LoopEnd::ExchangeFailed(error));
            }
        };

        let rendered = format!("{} => {}", reply.role(), reply.content());
        persistence.session().append_reply_turn(reply);
        writeln!(output, "{rendered}")?;
    }
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
