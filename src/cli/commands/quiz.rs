//! Interactive quiz over a saved card file.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Context;
use console::style;

use flashscrape::quiz::{Outcome, Quiz};
use flashscrape::sink::read_cards;
use flashscrape::Settings;

/// Typed alone on a line, ends the quiz early.
const QUIT: &str = ":q";

/// Quiz on the cards in `cards_file`, reading answers from stdin.
pub fn cmd_quiz(settings: &Settings, cards_file: &Path) -> anyhow::Result<()> {
    let cards = read_cards(cards_file)
        .with_context(|| format!("Failed to load cards from {}", cards_file.display()))?;
    let mut quiz = Quiz::new(cards, settings.quiz.clone())?;

    println!(
        "{} {} cards. Type the answer and press Enter ({} to stop).",
        style("→").cyan(),
        quiz.remaining(),
        QUIT
    );

    let stdin = std::io::stdin();
    run(&mut quiz, stdin.lock(), std::io::stdout())?;

    let score = quiz.score();
    println!(
        "{} Score: {} of {} on the first pass ({}%)",
        style("✓").green(),
        score.correct,
        score.total,
        score.percent()
    );
    Ok(())
}

/// Drive `quiz` from `input` until it finishes, the input ends or the
/// player quits.
fn run<R: BufRead, W: Write>(quiz: &mut Quiz, input: R, mut out: W) -> anyhow::Result<()> {
    let mut lines = input.lines();

    while let Some(prompt) = quiz.prompt() {
        write!(out, "{} ", style(format!("{}?", prompt)).bold())?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;
        if line.trim() == QUIT {
            break;
        }

        let round = quiz.round_number();
        match quiz.answer(&line) {
            Outcome::Blank => continue,
            Outcome::Correct => writeln!(out, "{} Correct", style("✓").green())?,
            Outcome::Incorrect { expected } => writeln!(
                out,
                "{} Incorrect, the answer is: {}",
                style("✗").red(),
                expected
            )?,
        }
        if quiz.round_number() != round {
            writeln!(
                out,
                "{} Reviewing {} missed card(s)",
                style("→").cyan(),
                quiz.remaining()
            )?;
        }
    }
    Ok(())
}
