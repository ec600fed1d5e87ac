//! Answer grading and round scoring for trivia play.

use rand::{seq::SliceRandom, Rng};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{models::TriviaQuestion, utils::Difficulty};

const ANSWER_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Accepts `a`..`d` in any case, with surrounding whitespace.
pub fn normalize_answer_letter(answer: &str) -> Option<char> {
    let mut chars = answer.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !ANSWER_LETTERS.contains(&letter) {
        return None;
    }
    Some(letter)
}

pub fn calculate_reward(difficulty: Difficulty, correct: bool) -> Decimal {
    if correct {
        difficulty.base_reward()
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerGrade {
    pub is_correct: bool,
    pub reward: Decimal,
}

/// Checks a submitted letter against the question. A correct answer earns the
/// question's own reward amount.
pub fn grade_answer(question: &TriviaQuestion, answer: &str) -> AnswerGrade {
    let is_correct = match (
        normalize_answer_letter(answer),
        normalize_answer_letter(&question.correct_answer),
    ) {
        (Some(given), Some(expected)) => given == expected,
        _ => false,
    };

    AnswerGrade {
        is_correct,
        reward: if is_correct {
            question.reward_amount
        } else {
            Decimal::ZERO
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn feedback(&self) -> &'static str {
        match self {
            Grade::A => "Outstanding! You really know your stuff.",
            Grade::B => "Great work!",
            Grade::C => "Not bad, keep playing!",
            Grade::D => "You can do better. Study up and try again.",
            Grade::F => "Don't give up! Learn and come back.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub percentage: u32,
    pub grade: Grade,
}

/// Round score as a rounded percentage and letter grade. An empty round scores 0.
pub fn calculate_score(total_questions: u32, correct_answers: u32) -> Score {
    let percentage = if total_questions == 0 {
        0
    } else {
        let correct = correct_answers.min(total_questions) as f64;
        (correct / total_questions as f64 * 100.0).round() as u32
    };

    let grade = match percentage {
        90..=u32::MAX => Grade::A,
        80..=89 => Grade::B,
        70..=79 => Grade::C,
        60..=69 => Grade::D,
        _ => Grade::F,
    };

    Score { percentage, grade }
}

/// Shuffles answer options and returns the new position of the correct one.
pub fn shuffle_answers<R: Rng + ?Sized>(
    answers: &[String],
    correct_index: usize,
    rng: &mut R,
) -> (Vec<String>, Option<usize>) {
    let mut order: Vec<usize> = (0..answers.len()).collect();
    order.shuffle(rng);

    let new_correct = order.iter().position(|&from| from == correct_index);
    let shuffled = order.into_iter().map(|i| answers[i].clone()).collect();
    (shuffled, new_correct)
}
