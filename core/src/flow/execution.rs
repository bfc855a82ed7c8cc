// engagement/src/flow/execution.rs

//! `Flow::run()`: executes steps in order against one shared context.

use super::control::{FlowControl, FlowResult};
use super::definition::Flow;
use crate::error::EngagementError;
use crate::shared::Shared;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<EngagementError> + Send + Sync + 'static,
{
  /// Runs every step. A non-optional step without handlers is a flow error;
  /// an optional one is skipped.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: Shared<TData>) -> Result<FlowResult, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "flow_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_if) = &step_def.skip_if {
        // The read guard ends with this statement.
        let skip = skip_if(&*ctx.read());
        if skip {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by its condition.");
          continue;
        }
      }

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        _ => {
          event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
          return Err(Err::from(EngagementError::Flow {
            flow: self.name.clone(),
            step_name: step_def.name.clone(),
            message: "no handler registered".to_string(),
          }));
        }
      };

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(parent: &step_span, Level::DEBUG, "step_handler", handler_index = handler_idx);
        match handler_fn(ctx.clone()).instrument(handler_span).await {
          Ok(FlowControl::Continue) => {}
          Ok(FlowControl::Stop) => {
            event!(parent: &step_span, Level::INFO, "Flow stopped by a handler.");
            return Ok(FlowResult::Stopped);
          }
          Err(e) => {
            event!(parent: &step_span, Level::WARN, error = %e, "Step handler failed.");
            return Err(e);
          }
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Flow execution completed.");
    Ok(FlowResult::Completed)
  }
}
