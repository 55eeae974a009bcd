use crate::model::ShiftAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoState {
    Empty,
    Armed,
}

/// Tampon d'annulation à un seul niveau : au plus un instantané des affectations.
#[derive(Debug, Clone, Default)]
pub struct UndoBuffer {
    snapshot: Option<Vec<ShiftAssignment>>,
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self { snapshot: None }
    }

    pub fn state(&self) -> UndoState {
        if self.snapshot.is_some() {
            UndoState::Armed
        } else {
            UndoState::Empty
        }
    }

    /// Arme le tampon ; écrase tout instantané précédent.
    pub fn arm(&mut self, assignments: &[ShiftAssignment]) {
        self.snapshot = Some(assignments.to_vec());
    }

    /// Consomme l'instantané.
    pub fn take(&mut self) -> Option<Vec<ShiftAssignment>> {
        self.snapshot.take()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}
