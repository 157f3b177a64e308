use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GameRules, Mover};
use crate::error::{GameError, Result};
use crate::room::{PlayerSlot, RoomDocument};

/// Simultaneous-move rock-paper-scissors with a running round log
pub struct RockPaperScissors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    /// The one hand this hand defeats
    pub fn beats(self) -> Hand {
        match self {
            Hand::Rock => Hand::Scissors,
            Hand::Paper => Hand::Rock,
            Hand::Scissors => Hand::Paper,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Rock => f.write_str("rock"),
            Hand::Paper => f.write_str("paper"),
            Hand::Scissors => f.write_str("scissors"),
        }
    }
}

impl FromStr for Hand {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Hand::Rock),
            "paper" | "p" => Ok(Hand::Paper),
            "scissors" | "s" => Ok(Hand::Scissors),
            other => Err(GameError::InvalidMove(format!("unknown hand: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Tie,
    Winner(PlayerSlot),
}

/// Resolves one round and renders the history line for it.
///
/// The line always names player1 first.
pub fn resolve_round(
    player1: &str,
    hand1: Hand,
    player2: &str,
    hand2: Hand,
) -> (RoundOutcome, String) {
    let (outcome, result) = if hand1 == hand2 {
        (RoundOutcome::Tie, "It's a Tie!".to_string())
    } else if hand1.beats() == hand2 {
        (RoundOutcome::Winner(PlayerSlot::Player1), format!("{} wins!", player1))
    } else {
        (RoundOutcome::Winner(PlayerSlot::Player2), format!("{} wins!", player2))
    };

    let summary = format!(
        "{} chose {}, {} chose {}. {}",
        player1, hand1, player2, hand2, result
    );
    (outcome, summary)
}

impl GameRules for RockPaperScissors {
    type Move = Hand;

    const NAME: &'static str = "rock-paper-scissors";
    const POLL_INTERVAL: Duration = Duration::from_millis(1500);

    fn seed() -> RoomDocument {
        RoomDocument {
            current_turn: Some(PlayerSlot::Player1),
            ..RoomDocument::default()
        }
    }

    fn apply(doc: &mut RoomDocument, mover: Mover<'_>, hand: &Hand) -> Result<()> {
        let (player1, player2) = match (&doc.players.player1, &doc.players.player2) {
            (Some(p1), Some(p2)) => (p1.clone(), p2.clone()),
            _ => return Err(GameError::WaitingForOpponent),
        };

        if doc.moves.contains_key(mover.id) {
            return Err(GameError::AlreadyMoved(mover.id.to_string()));
        }
        doc.moves.insert(mover.id.to_string(), *hand);

        if let (Some(&hand1), Some(&hand2)) = (doc.moves.get(&player1), doc.moves.get(&player2)) {
            let (outcome, summary) = resolve_round(&player1, hand1, &player2, hand2);
            tracing::debug!(?outcome, summary = %summary, "Round resolved");

            doc.history.push(summary);
            doc.moves.clear();
            doc.current_turn = Some(doc.current_turn.unwrap_or(PlayerSlot::Player1).other());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seated() -> RoomDocument {
        let mut doc = RockPaperScissors::seed();
        doc.players.claim("alice");
        doc.players.claim("bob");
        doc
    }

    fn alice() -> Mover<'static> {
        Mover { id: "alice", slot: PlayerSlot::Player1 }
    }

    fn bob() -> Mover<'static> {
        Mover { id: "bob", slot: PlayerSlot::Player2 }
    }

    #[test]
    fn test_beats_is_cyclic() {
        for hand in Hand::ALL {
            assert_ne!(hand.beats(), hand);
            // Each hand loses to exactly one other
            let losers_to: Vec<Hand> = Hand::ALL.into_iter().filter(|h| h.beats() == hand).collect();
            assert_eq!(losers_to.len(), 1);
        }
    }

    #[test]
    fn test_resolve_round_labels() {
        let (outcome, summary) = resolve_round("alice", Hand::Rock, "bob", Hand::Scissors);
        assert_eq!(outcome, RoundOutcome::Winner(PlayerSlot::Player1));
        assert_eq!(summary, "alice chose rock, bob chose scissors. alice wins!");

        // Same hands, seats swapped: the rock player still wins
        let (outcome, summary) = resolve_round("bob", Hand::Scissors, "alice", Hand::Rock);
        assert_eq!(outcome, RoundOutcome::Winner(PlayerSlot::Player2));
        assert!(summary.ends_with("alice wins!"));
    }

    #[test]
    fn test_resolve_round_ties() {
        for hand in Hand::ALL {
            let (outcome, summary) = resolve_round("a", hand, "b", hand);
            assert_eq!(outcome, RoundOutcome::Tie);
            assert!(summary.ends_with("It's a Tie!"));
        }
    }

    #[test]
    fn test_round_resolves_in_either_order() {
        for first_alice in [true, false] {
            let mut doc = seated();
            if first_alice {
                RockPaperScissors::apply(&mut doc, alice(), &Hand::Rock).unwrap();
                assert_eq!(doc.moves.len(), 1);
                RockPaperScissors::apply(&mut doc, bob(), &Hand::Scissors).unwrap();
            } else {
                RockPaperScissors::apply(&mut doc, bob(), &Hand::Scissors).unwrap();
                RockPaperScissors::apply(&mut doc, alice(), &Hand::Rock).unwrap();
            }

            assert!(doc.moves.is_empty());
            assert_eq!(doc.history, vec!["alice chose rock, bob chose scissors. alice wins!"]);
            assert_eq!(doc.current_turn, Some(PlayerSlot::Player2));
        }
    }

    #[test]
    fn test_second_submission_rejected() {
        let mut doc = seated();
        RockPaperScissors::apply(&mut doc, alice(), &Hand::Paper).unwrap();

        let err = RockPaperScissors::apply(&mut doc, alice(), &Hand::Rock).unwrap_err();
        assert!(matches!(err, GameError::AlreadyMoved(ref p) if p == "alice"));
        assert_eq!(doc.moves.get("alice"), Some(&Hand::Paper));
    }

    #[test]
    fn test_waits_for_opponent() {
        let mut doc = RockPaperScissors::seed();
        doc.players.claim("alice");

        let err = RockPaperScissors::apply(&mut doc, alice(), &Hand::Rock).unwrap_err();
        assert!(matches!(err, GameError::WaitingForOpponent));
        assert!(doc.moves.is_empty());
    }

    #[test]
    fn test_history_only_grows() {
        let mut doc = seated();
        let mut last_len = 0;
        let rounds = [
            (Hand::Rock, Hand::Rock),
            (Hand::Paper, Hand::Rock),
            (Hand::Scissors, Hand::Rock),
        ];

        for (a, b) in rounds {
            RockPaperScissors::apply(&mut doc, alice(), &a).unwrap();
            assert!(doc.history.len() >= last_len);
            RockPaperScissors::apply(&mut doc, bob(), &b).unwrap();
            assert_eq!(doc.history.len(), last_len + 1);
            last_len = doc.history.len();
        }

        assert_eq!(doc.history[0], "alice chose rock, bob chose rock. It's a Tie!");
        assert_eq!(doc.history[2], "alice chose scissors, bob chose rock. bob wins!");
    }

    #[test]
    fn test_parse_hand() {
        assert_eq!("Rock".parse::<Hand>().unwrap(), Hand::Rock);
        assert_eq!(" s ".parse::<Hand>().unwrap(), Hand::Scissors);
        assert!("lizard".parse::<Hand>().is_err());
    }
}
