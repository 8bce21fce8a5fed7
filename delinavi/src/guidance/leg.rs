//! The maneuver plan between two stops.

use crate::maneuver::Maneuver;

use super::dispatcher::Stage;

/// Maneuver list plus a cursor into it.
///
/// Invariants: `cursor <= maneuvers.len()`, and `cursor == maneuvers.len()`
/// means the leg is exhausted. The stage state belongs to the maneuver under
/// the cursor and is cleared whenever the cursor moves. A leg is only ever
/// replaced as a whole; nothing outside the tracker mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    start_index: usize,
    end_index: usize,
    maneuvers: Vec<Maneuver>,
    cursor: usize,
    /// Stage of the last fix, `None` before the first one.
    stage: Option<Stage>,
    /// Closest stage announced for the current maneuver.
    announced: Option<Stage>,
}

impl Leg {
    pub fn new(start_index: usize, end_index: usize, maneuvers: Vec<Maneuver>) -> Self {
        Self {
            start_index,
            end_index,
            maneuvers,
            cursor: 0,
            stage: None,
            announced: None,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn maneuvers(&self) -> &[Maneuver] {
        &self.maneuvers
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// The maneuver under the cursor.
    pub fn next_maneuver(&self) -> Option<&Maneuver> {
        self.maneuvers.get(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.maneuvers.len()
    }

    /// Move past the current maneuver and reset its stage state.
    pub(crate) fn advance(&mut self) {
        if self.cursor < self.maneuvers.len() {
            self.cursor += 1;
            self.stage = None;
            self.announced = None;
        }
    }

    /// Record the stage of the latest fix.
    ///
    /// Returns `true` when the stage changed and is closer than anything
    /// announced for the current maneuver.
    pub(crate) fn enter_stage(&mut self, stage: Stage) -> bool {
        if self.stage == Some(stage) {
            return false;
        }
        self.stage = Some(stage);
        if self.announced.is_some_and(|a| stage <= a) {
            return false;
        }
        self.announced = Some(stage);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn two_maneuvers() -> Leg {
        Leg::new(
            0,
            9,
            vec![
                Maneuver::arrive(4, Coordinate::new(0.0, 0.0)),
                Maneuver::arrive(9, Coordinate::new(0.0, 0.001)),
            ],
        )
    }

    #[test]
    fn test_new_leg_starts_at_first_maneuver() {
        let leg = two_maneuvers();
        assert_eq!(leg.cursor(), 0);
        assert_eq!(leg.stage(), None);
        assert_eq!(leg.next_maneuver().map(|m| m.route_index), Some(4));
        assert!(!leg.is_exhausted());
    }

    #[test]
    fn test_advance_resets_stage() {
        let mut leg = two_maneuvers();
        assert!(leg.enter_stage(Stage::Near));
        leg.advance();
        assert_eq!(leg.cursor(), 1);
        assert_eq!(leg.stage(), None);
        // Same stage value fires again for the new maneuver
        assert!(leg.enter_stage(Stage::Near));
    }

    #[test]
    fn test_advance_saturates() {
        let mut leg = two_maneuvers();
        leg.advance();
        leg.advance();
        leg.advance();
        assert_eq!(leg.cursor(), 2);
        assert!(leg.is_exhausted());
        assert!(leg.next_maneuver().is_none());
    }

    #[test]
    fn test_enter_same_stage_twice() {
        let mut leg = two_maneuvers();
        assert!(leg.enter_stage(Stage::Far));
        assert!(!leg.enter_stage(Stage::Far));
    }
}
