use crate::error::{GameError, Result};

pub const MAX_ATTEMPTS: usize = 6;
pub const WORD_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterScore {
    Correct,
    Misplaced,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordleStatus {
    Playing,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub word: String,
    pub scores: Vec<LetterScore>,
}

/// Scores each letter of `guess` against `target`.
///
/// A letter that is not in its place but appears anywhere in the target is
/// `Misplaced`, however many times it appears.
pub fn score(guess: &str, target: &str) -> Vec<LetterScore> {
    let target: Vec<char> = target.chars().collect();
    guess
        .chars()
        .enumerate()
        .map(|(i, letter)| {
            if target.get(i) == Some(&letter) {
                LetterScore::Correct
            } else if target.contains(&letter) {
                LetterScore::Misplaced
            } else {
                LetterScore::Incorrect
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Wordle {
    target: String,
    attempts: Vec<Attempt>,
}

impl Wordle {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.trim().to_uppercase(),
            attempts: Vec::with_capacity(MAX_ATTEMPTS),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn remaining(&self) -> usize {
        MAX_ATTEMPTS.saturating_sub(self.attempts.len())
    }

    pub fn status(&self) -> WordleStatus {
        if self.attempts.last().map_or(false, |a| a.word == self.target) {
            WordleStatus::Won
        } else if self.attempts.len() >= MAX_ATTEMPTS {
            WordleStatus::Lost
        } else {
            WordleStatus::Playing
        }
    }

    /// Records a guess and returns its scores
    pub fn submit(&mut self, guess: &str) -> Result<&Attempt> {
        if self.status() != WordleStatus::Playing {
            return Err(GameError::GameOver);
        }

        let word = guess.trim().to_uppercase();
        if word.chars().count() != self.target.chars().count() {
            return Err(GameError::InvalidMove(format!(
                "guess must have {} letters",
                self.target.chars().count()
            )));
        }
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GameError::InvalidMove(format!("{} is not a word", guess.trim())));
        }

        let scores = score(&word, &self.target);
        self.attempts.push(Attempt { word, scores });
        Ok(&self.attempts[self.attempts.len() - 1])
    }
}
