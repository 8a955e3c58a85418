use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::workflow::view::Action;

/// Line-oriented questions on a terminal (or any reader/writer pair).
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Reads one trimmed line. End of input yields `UnexpectedEof`.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{} {}: ", "?".bold().green(), question.bold())?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"));
        }
        Ok(line.trim().to_string())
    }

    /// Picks one of `options` by number or exact text. An empty answer picks
    /// nothing when `allow_empty` is set.
    pub fn choose(
        &mut self,
        question: &str,
        options: &[String],
        allow_empty: bool,
    ) -> io::Result<Option<String>> {
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {:>2}) {}", i + 1, option)?;
        }
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                if allow_empty {
                    return Ok(None);
                }
                continue;
            }
            if let Ok(n) = answer.parse::<usize>() {
                if n >= 1 && n <= options.len() {
                    return Ok(Some(options[n - 1].clone()));
                }
            }
            if let Some(hit) = options.iter().find(|o| o.as_str() == answer) {
                return Ok(Some(hit.clone()));
            }
            writeln!(self.output, "{}", "pick a listed number or value".yellow())?;
        }
    }

    /// Waits for confirm (`c`, `y`) or cancel (`x`, `n`).
    pub fn decide(&mut self, question: &str) -> io::Result<Action> {
        loop {
            let answer = self.ask(question)?.to_lowercase();
            match answer.as_str() {
                "c" | "y" | "yes" | "confirm" | "確認" => return Ok(Action::Confirm),
                "x" | "n" | "no" | "cancel" | "取消" => return Ok(Action::Cancel),
                _ => continue,
            }
        }
    }

    pub fn yes_no(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let answer = self.ask(&format!("{question} [y/N]"))?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn choose_accepts_number_or_text_and_retries() {
        let options = vec!["北投".to_string(), "台南".to_string()];
        let mut p = prompt("9\n台南\n");
        assert_eq!(
            p.choose("region", &options, false).unwrap().as_deref(),
            Some("台南")
        );
        let mut p = prompt("1\n");
        assert_eq!(
            p.choose("region", &options, false).unwrap().as_deref(),
            Some("北投")
        );
    }

    #[test]
    fn choose_empty_when_allowed() {
        let options = vec!["07".to_string()];
        let mut p = prompt("\n");
        assert_eq!(p.choose("code", &options, true).unwrap(), None);
    }

    #[test]
    fn decide_ignores_noise() {
        let mut p = prompt("maybe\nx\n");
        assert_eq!(p.decide("?").unwrap(), Action::Cancel);
    }

    #[test]
    fn eof_is_an_error() {
        let mut p = prompt("");
        assert_eq!(
            p.ask("name").unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }
}
