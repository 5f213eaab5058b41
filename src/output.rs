//! Terminal message helpers. Errors and warnings go to the error sink
//! (stderr by default), the rest to the output sink (stdout).

use crossterm::style::Stylize;
use std::io::{self, Write};

pub const SEPARATOR: &str = "-------------------------------------";

pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { out, err }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn line(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.cyan())
    }

    pub fn success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message.green())
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "{}", message.yellow())
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "{}", message.red())
    }

    /// Action banner, e.g. `-> Adding a new Product...`
    pub fn banner(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "\n-> {}", message.bold())
    }

    pub fn separator(&mut self) -> io::Result<()> {
        writeln!(self.out, "{SEPARATOR}")
    }

    /// Print pre-rendered text verbatim.
    pub fn block(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out)?;
        write!(self.out, "{text}")?;
        self.out.flush()
    }
}
