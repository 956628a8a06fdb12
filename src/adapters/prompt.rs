//! Line-based operator prompt over stdin (UART console on ESP-IDF).

use std::io::{BufRead, Write};

use crate::ports::{OperatorPrompt, PromptError};

/// Prints the message and waits for the operator to press enter.
pub struct StdinPrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl StdinPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> OperatorPrompt for StdinPrompt<R, W> {
    fn confirm(&mut self, message: &str) -> Result<(), PromptError> {
        write!(self.output, "{message} [enter] ").map_err(|_| PromptError)?;
        self.output.flush().map_err(|_| PromptError)?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            // EOF: nobody is there to confirm.
            Ok(0) | Err(_) => Err(PromptError),
            Ok(_) => Ok(()),
        }
    }
}
