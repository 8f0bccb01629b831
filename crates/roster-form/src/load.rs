//! Generation tokens for background loads.
//!
//! Every load takes a ticket when it starts and presents it when it wants to
//! commit. Starting a newer load, or tearing the form down, retires older
//! tickets, so a late response from a superseded load is dropped instead of
//! overwriting newer state.

/// Counter for one kind of load.
#[derive(Debug, Default)]
pub struct Generation {
  current: u64,
}

/// Proof that a load was started; valid until the next [`Generation::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
  generation: u64,
}

impl Generation {
  pub fn begin(&mut self) -> LoadTicket {
    self.current += 1;
    LoadTicket { generation: self.current }
  }

  pub fn is_current(&self, ticket: LoadTicket) -> bool { ticket.generation == self.current }

  /// Retire every outstanding ticket.
  pub fn cancel(&mut self) { self.current += 1; }
}

/// The loads that may be superseded while in flight.
#[derive(Debug, Default)]
pub struct Loads {
  pub grid:      Generation,
  pub documents: Generation,
}

impl Loads {
  pub fn cancel_all(&mut self) {
    self.grid.cancel();
    self.documents.cancel();
  }
}
