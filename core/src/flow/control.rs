// engagement/src/flow/control.rs

/// Signal from a handler indicating whether the flow should continue or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Halt immediately. Remaining handlers and steps do not run.
  Stop,
}

/// Outcome of a full flow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowResult {
  Completed,
  Stopped,
}
