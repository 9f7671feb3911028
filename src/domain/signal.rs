//! Crossover detection.
//!
//! A `Buy` fires at bar `i` when the momentum line moves from at-or-below the
//! signal line at `i - 1` to strictly above it at `i`; a `Sell` fires on the
//! mirror-image move. Bar 0 never fires. Undefined values on either bar
//! compare false, so nothing fires inside the warm-up window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::indicator::OscillatorPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub index: usize,
    pub kind: SignalKind,
}

/// Classify the move between two consecutive points.
pub fn crossover(prev: &OscillatorPoint, curr: &OscillatorPoint) -> Option<SignalKind> {
    let (prev_m, prev_s) = prev.values()?;
    let (curr_m, curr_s) = curr.values()?;

    let buy = curr_m > curr_s && prev_m <= prev_s;
    let sell = curr_m < curr_s && prev_m >= prev_s;
    debug_assert!(!(buy && sell), "buy and sell on the same bar");

    if buy {
        Some(SignalKind::Buy)
    } else if sell {
        Some(SignalKind::Sell)
    } else {
        None
    }
}

/// Lazy iterator over the crossover events of a point series. Clone it
/// before consuming, or call [`detect`] again, to replay the sequence.
#[derive(Debug, Clone)]
pub struct Crossovers<'a> {
    points: &'a [OscillatorPoint],
    next: usize,
}

impl Iterator for Crossovers<'_> {
    type Item = SignalEvent;

    fn next(&mut self) -> Option<SignalEvent> {
        while self.next < self.points.len() {
            let i = self.next;
            self.next += 1;
            if let Some(kind) = crossover(&self.points[i - 1], &self.points[i]) {
                return Some(SignalEvent {
                    date: self.points[i].date,
                    index: i,
                    kind,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.points.len().saturating_sub(self.next)))
    }
}

impl std::iter::FusedIterator for Crossovers<'_> {}

pub fn detect(points: &[OscillatorPoint]) -> Crossovers<'_> {
    Crossovers { points, next: 1 }
}
