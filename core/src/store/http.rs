// engagement/src/store/http.rs

//! `HttpStore`: the repository traits over the marketplace REST API.

use super::{JobRepository, MutationReceipt, OrderMutation, OrderRepository, ProposalMutation, ProposalRepository};
use crate::config::EngagementConfig;
use crate::error::{EngagementError, EngagementResult};
use crate::model::{Job, Order, Proposal};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{event, instrument, Level};

#[derive(Debug, Deserialize)]
struct JobsEnvelope {
  jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
  job: Job,
}

#[derive(Debug, Deserialize)]
struct ProposalsEnvelope {
  proposals: Vec<Proposal>,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
  success: bool,
  #[serde(default)]
  order: Option<Order>,
}

/// The record a request is about, for `NotFound` reporting.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
  entity: &'static str,
  id: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpStore {
  client: Client,
  base_url: String,
  timeout: Duration,
}

impl HttpStore {
  pub fn new(config: &EngagementConfig) -> EngagementResult<Self> {
    let client = Client::builder()
      .timeout(config.request_timeout)
      .build()
      .map_err(|e| EngagementError::Config {
        field: "httpClient".to_string(),
        message: e.to_string(),
      })?;
    Ok(Self {
      client,
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
      timeout: config.request_timeout,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Sends `request` and decodes a 2xx body as `T`. An empty 2xx body decodes as JSON `null`.
  async fn send<T: DeserializeOwned>(
    &self,
    operation: &str,
    request: RequestBuilder,
    target: Target<'_>,
  ) -> EngagementResult<T> {
    let response = request.send().await.map_err(|e| self.transport_error(operation, e))?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| self.transport_error(operation, e))?;

    if let Some(err) = classify_status(status, &body, target.entity, target.id) {
      event!(Level::WARN, operation, status, error = %err, "Store rejected request.");
      return Err(err);
    }

    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|e| {
      EngagementError::from(anyhow::Error::new(e).context(format!("decoding {} response", operation)))
    })
  }

  fn transport_error(&self, operation: &str, err: reqwest::Error) -> EngagementError {
    if err.is_timeout() {
      EngagementError::Timeout {
        operation: operation.to_string(),
        timeout: self.timeout,
      }
    } else {
      EngagementError::network(err.to_string())
    }
  }
}

/// Maps a non-2xx status to the error callers see. Returns `None` for success.
pub fn classify_status(status: u16, body: &str, entity: &'static str, id: &str) -> Option<EngagementError> {
  match status {
    200..=299 => None,
    404 => Some(EngagementError::not_found(entity, id)),
    409 => Some(EngagementError::conflict(body_message(body))),
    400 | 422 => Some(EngagementError::validation("request", body_message(body))),
    other => Some(EngagementError::network(format!("unexpected status {}: {}", other, body_message(body)))),
  }
}

/// The `message` or `error` string of a JSON body, otherwise the body itself.
fn body_message(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| {
      v.get("message")
        .or_else(|| v.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
    })
    .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl JobRepository for HttpStore {
  #[instrument(name = "HttpStore::list_jobs", skip(self), err(Display))]
  async fn list_jobs(&self) -> EngagementResult<Vec<Job>> {
    let request = self.client.get(self.url("/jobs"));
    let envelope: JobsEnvelope = self
      .send("list_jobs", request, Target { entity: "jobs", id: "" })
      .await?;
    Ok(envelope.jobs)
  }

  #[instrument(name = "HttpStore::get_job", skip(self), err(Display))]
  async fn get_job(&self, job_id: &str) -> EngagementResult<Job> {
    let request = self.client.get(self.url(&format!("/jobs/{}", job_id)));
    let envelope: JobEnvelope = self
      .send("get_job", request, Target { entity: "job", id: job_id })
      .await?;
    Ok(envelope.job)
  }
}

#[async_trait]
impl ProposalRepository for HttpStore {
  #[instrument(name = "HttpStore::list_proposals", skip(self), err(Display))]
  async fn list_proposals(&self, job_id: &str) -> EngagementResult<Vec<Proposal>> {
    let request = self.client.get(self.url(&format!("/jobs/{}/proposals", job_id)));
    let envelope: ProposalsEnvelope = self
      .send("list_proposals", request, Target { entity: "job", id: job_id })
      .await?;
    Ok(envelope.proposals)
  }

  #[instrument(name = "HttpStore::mutate_proposal", skip(self), err(Display))]
  async fn mutate_proposal(
    &self,
    job_id: &str,
    proposal_id: &str,
    mutation: ProposalMutation,
  ) -> EngagementResult<MutationReceipt> {
    let target = Target {
      entity: "proposal",
      id: proposal_id,
    };
    match mutation {
      ProposalMutation::Accept => {
        let url = self.url(&format!("/jobs/{}/proposals/{}/accept", job_id, proposal_id));
        // A 2xx without a body still means the proposal was accepted.
        let receipt: Option<MutationReceipt> = self.send("accept_proposal", self.client.patch(url), target).await?;
        Ok(receipt.unwrap_or_default())
      }
      ProposalMutation::Reject { reason } => {
        let url = self.url(&format!("/jobs/{}/proposals/{}/reject", job_id, proposal_id));
        let request = self.client.patch(url).json(&json!({ "reason": reason }));
        let _: Option<Value> = self.send("reject_proposal", request, target).await?;
        Ok(MutationReceipt::default())
      }
    }
  }
}

#[async_trait]
impl OrderRepository for HttpStore {
  #[instrument(name = "HttpStore::get_order", skip(self), err(Display))]
  async fn get_order(&self, order_id: &str) -> EngagementResult<Order> {
    let request = self.client.get(self.url(&format!("/orders/{}", order_id)));
    let envelope: OrderEnvelope = self
      .send("get_order", request, Target { entity: "order", id: order_id })
      .await?;
    match envelope {
      OrderEnvelope {
        success: true,
        order: Some(order),
      } => Ok(order),
      _ => Err(EngagementError::not_found("order", order_id)),
    }
  }

  #[instrument(name = "HttpStore::mutate_order", skip(self, mutation), err(Display))]
  async fn mutate_order(&self, order_id: &str, mutation: OrderMutation) -> EngagementResult<MutationReceipt> {
    let order_target = Target {
      entity: "order",
      id: order_id,
    };
    let deliverable_url = |deliverable_id: &str, verb: &str| {
      self.url(&format!("/orders/{}/deliverables/{}/{}", order_id, deliverable_id, verb))
    };

    let (operation, request) = match mutation {
      OrderMutation::Deliver { deliverable_id, files } => (
        "deliver",
        self.client.patch(deliverable_url(&deliverable_id, "deliver")).json(&json!({ "files": files })),
      ),
      OrderMutation::Approve { deliverable_id } => (
        "approve",
        self.client.patch(deliverable_url(&deliverable_id, "approve")),
      ),
      OrderMutation::RequestRevision { deliverable_id, note } => (
        "request_revision",
        self.client.patch(deliverable_url(&deliverable_id, "revision")).json(&json!({ "note": note })),
      ),
      OrderMutation::SubmitReview {
        author_role,
        rating,
        text,
      } => (
        "submit_review",
        self
          .client
          .post(self.url(&format!("/orders/{}/reviews", order_id)))
          .json(&json!({ "authorRole": author_role, "rating": rating, "text": text })),
      ),
      OrderMutation::Cancel { actor, reason } => (
        "cancel_order",
        self
          .client
          .patch(self.url(&format!("/orders/{}/cancel", order_id)))
          .json(&json!({ "actor": actor, "reason": reason })),
      ),
    };

    let _: Option<Value> = self.send(operation, request, order_target).await?;
    Ok(MutationReceipt::default())
  }
}
