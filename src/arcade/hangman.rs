use std::collections::BTreeSet;

pub const MAX_WRONG: u8 = 6;
pub const WORD_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangmanStatus {
    Playing,
    Won,
    Lost,
}

/// Complete state of one hangman game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hangman {
    answer: String,
    guessed: BTreeSet<char>,
    wrong: u8,
    max_wrong: u8,
}

impl Hangman {
    pub fn new(answer: &str) -> Self {
        Self::with_max_wrong(answer, MAX_WRONG)
    }

    pub fn with_max_wrong(answer: &str, max_wrong: u8) -> Self {
        Self {
            answer: answer.trim().to_lowercase(),
            guessed: BTreeSet::new(),
            wrong: 0,
            max_wrong,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn guessed(&self) -> &BTreeSet<char> {
        &self.guessed
    }

    pub fn wrong_guesses(&self) -> u8 {
        self.wrong
    }

    pub fn max_wrong(&self) -> u8 {
        self.max_wrong
    }

    /// The answer with unguessed letters shown as `_`
    pub fn masked(&self) -> String {
        self.answer
            .chars()
            .map(|c| if self.guessed.contains(&c) { c } else { '_' })
            .collect()
    }

    pub fn status(&self) -> HangmanStatus {
        if self.answer.chars().all(|c| self.guessed.contains(&c)) {
            HangmanStatus::Won
        } else if self.wrong >= self.max_wrong {
            HangmanStatus::Lost
        } else {
            HangmanStatus::Playing
        }
    }
}

/// Next state after guessing `letter`.
///
/// Non-letters, repeated letters and guesses after the game ended return
/// the state unchanged.
pub fn guess(state: Hangman, letter: char) -> Hangman {
    let letter = letter.to_ascii_lowercase();
    if !letter.is_ascii_alphabetic()
        || state.guessed.contains(&letter)
        || state.status() != HangmanStatus::Playing
    {
        return state;
    }

    let miss = !state.answer.contains(letter);
    let mut guessed = state.guessed;
    guessed.insert(letter);

    Hangman {
        guessed,
        wrong: state.wrong + u8::from(miss),
        ..state
    }
}
