//! Hysteresis gate: a candidate must hold for consecutive frames before it commits.

/// Consecutive-frame confirmation for a candidate value.
///
/// `step` is called once per frame with the candidate whose condition holds
/// this frame (or `None`). The candidate commits when it has been offered on
/// more than `required` consecutive frames. Any gap or change of candidate
/// restarts the count.
#[derive(Debug, Clone)]
pub struct HysteresisGate<T> {
    required: u32,
    pending: Option<T>,
    count: u32,
}

impl<T: Copy + PartialEq> HysteresisGate<T> {
    pub fn new(required: u32) -> Self {
        Self {
            required,
            pending: None,
            count: 0,
        }
    }

    /// Changes the confirmation length; an in-progress count is kept.
    pub fn set_required(&mut self, required: u32) {
        self.required = required;
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn step(&mut self, candidate: Option<T>) -> Option<T> {
        let Some(candidate) = candidate else {
            self.reset();
            return None;
        };

        if self.pending == Some(candidate) {
            self.count += 1;
        } else {
            self.pending = Some(candidate);
            self.count = 1;
        }

        if self.count > self.required {
            self.reset();
            Some(candidate)
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.count = 0;
    }

    pub fn pending(&self) -> Option<T> {
        self.pending
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
