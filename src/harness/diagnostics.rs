//! Diagnostic lines
//!
//! Every server start and client invocation is announced on both stdout and
//! stderr so captured output can be compared against a stored baseline.

use std::io::{self, Write};

use super::plan::{ClientInvocation, SubScenario};

/// `server <x><s> : "<init>"`
pub fn server_line(sub: &SubScenario) -> String {
    format!("server {}{} : \"{}\"", sub.x, sub.s, sub.init)
}

/// `server <x><s> : "<init>", client <c>: <history><TAG>`
pub fn client_line(client: &ClientInvocation) -> String {
    format!(
        "server {}{} : \"{}\", client {}: {}{}",
        client.x,
        client.s,
        client.init,
        client.c,
        client.history(),
        client.protocol.tag()
    )
}

/// Destination for diagnostic lines
pub trait DiagnosticSink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

/// Writes each line to stdout, then stderr, flushing both
#[derive(Debug, Default)]
pub struct StdStreams;

impl DiagnosticSink for StdStreams {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        write_line(&mut io::stdout().lock(), line)?;
        write_line(&mut io::stderr().lock(), line)
    }
}

fn write_line<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    write!(out, "\n{line}\n")?;
    out.flush()
}

/// Collects lines in memory
impl DiagnosticSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        (**self).emit(line)
    }
}
