//! Interactive yes/no questions

use std::io::{self, BufRead, Write};

/// How to treat the "show results?" question of a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowResults {
    /// Ask on the terminal
    Ask,
    /// Show without asking
    Always,
    /// Never show
    Never,
}

impl ShowResults {
    /// Pick the mode from the `--yes` / `--no` flags
    pub fn from_flags(yes: bool, no: bool) -> Self {
        match (yes, no) {
            (true, _) => ShowResults::Always,
            (false, true) => ShowResults::Never,
            (false, false) => ShowResults::Ask,
        }
    }
}

/// Interpret one answer
///
/// Accepts `y`, `yes`, `n` and `no` in any case. Anything else (including
/// an empty line) is `None` and the question should be asked again.
pub fn parse_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Ask `question` until a valid answer is given
///
/// End of input counts as "no".
pub fn ask_yes_no<R, W>(question: &str, input: &mut R, output: &mut W) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "{} [y/n] ", question)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }

        match parse_answer(&line) {
            Some(answer) => return Ok(answer),
            None => writeln!(output, "Please answer y or n.")?,
        }
    }
}

/// Ask on the process's stdin/stdout
pub fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    ask_yes_no(question, &mut input, &mut output)
}
