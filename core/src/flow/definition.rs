// engagement/src/flow/definition.rs

//! `Flow<TData, Err>` construction: step list and handler registration.

use super::control::FlowControl;
use crate::error::EngagementError;
use crate::shared::Shared;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// An async step handler. It receives a clone of the shared flow context.
///
/// Lock guards taken on the context must be dropped before any `.await`.
pub type Handler<TData, Err> =
  Box<dyn Fn(Shared<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync>;

/// When it returns true the step is skipped.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<EngagementError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<EngagementError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: name.into(),
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Registers a handler for `step_name`. Handlers of one step run in registration order.
  ///
  /// # Panics
  ///
  /// If `step_name` is not part of the flow. That is a wiring mistake, not a runtime condition.
  pub fn on<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(Shared<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Flow '{}' setup error: step '{}' is not defined.", self.name, step_name);
    }
    let handler: Handler<TData, Err> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
  }
}
