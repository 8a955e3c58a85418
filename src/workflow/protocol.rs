use thiserror::Error;
use tracing::{debug, info, warn};

use super::policy::CategoryPolicy;
use super::selection::FormSelection;
use super::validate::{validate, ValidationError};
use crate::service::{
    ConfirmedResult, CustomerIdService, CustomerRequest, PreviewResult, ServiceError,
};

/// Identifies one in-flight request so a late response can be recognised.
pub type Ticket = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Previewing {
        ticket: Ticket,
        request: CustomerRequest,
    },
    Previewed {
        request: CustomerRequest,
        preview: PreviewResult,
    },
    Confirming {
        ticket: Ticket,
        request: CustomerRequest,
        preview: PreviewResult,
    },
    Confirmed {
        request: CustomerRequest,
        confirmed: ConfirmedResult,
    },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Previewing { .. } => "previewing",
            WorkflowState::Previewed { .. } => "previewed",
            WorkflowState::Confirming { .. } => "confirming",
            WorkflowState::Confirmed { .. } => "confirmed",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Previewing { .. } | WorkflowState::Confirming { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("preview request failed: {0}")]
    Preview(#[source] ServiceError),

    #[error("confirm request failed: {0}")]
    Confirm(#[source] ServiceError),

    #[error("a request is already in flight")]
    Busy,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("response arrived after the workflow moved on")]
    Superseded,
}

/// Outcome of feeding a response back into the workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion<T> {
    Applied(T),
    /// The workflow no longer waits for this ticket; nothing changed.
    Stale,
}

/// Two-phase allocation: preview a tentative identifier, then either commit
/// exactly the previewed request or drop it.
///
/// The `begin_*`/`complete_*` pairs are the raw transitions; [`Workflow::submit`]
/// and [`Workflow::confirm`] drive them against the service.
pub struct Workflow<S> {
    service: S,
    policy: CategoryPolicy,
    state: WorkflowState,
    next_ticket: Ticket,
}

impl<S> Workflow<S> {
    pub fn new(service: S, policy: CategoryPolicy) -> Self {
        Self {
            service,
            policy,
            state: WorkflowState::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn policy(&self) -> &CategoryPolicy {
        &self.policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    fn issue_ticket(&mut self) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        ticket
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        if self.state.is_busy() {
            WorkflowError::Busy
        } else {
            WorkflowError::InvalidTransition {
                action,
                state: self.state.name(),
            }
        }
    }

    /// `Idle | Confirmed -> Previewing`. Inactive fields are stripped and the
    /// selection validated before anything is sent.
    pub fn begin_preview(
        &mut self,
        selection: &FormSelection,
    ) -> Result<(Ticket, CustomerRequest), WorkflowError> {
        if !matches!(
            self.state,
            WorkflowState::Idle | WorkflowState::Confirmed { .. }
        ) {
            return Err(self.invalid("submit"));
        }

        let mut selection = selection.clone();
        selection.apply_visibility(&self.policy);
        validate(&selection, &self.policy)?;

        let request = selection.to_request(&self.policy);
        let ticket = self.issue_ticket();
        debug!(ticket, "idle -> previewing");
        self.state = WorkflowState::Previewing {
            ticket,
            request: request.clone(),
        };
        Ok((ticket, request))
    }

    /// `Previewing -> Previewed` on success, `Previewing -> Idle` on failure.
    pub fn complete_preview(
        &mut self,
        ticket: Ticket,
        outcome: Result<PreviewResult, ServiceError>,
    ) -> Result<Completion<PreviewResult>, WorkflowError> {
        let request = match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Previewing {
                ticket: current,
                request,
            } if current == ticket => request,
            other => {
                debug!(ticket, state = other.name(), "ignoring stale preview response");
                self.state = other;
                return Ok(Completion::Stale);
            }
        };

        match outcome {
            Ok(preview) => {
                info!(customer_id = %preview.customer_id, "preview received");
                self.state = WorkflowState::Previewed {
                    request,
                    preview: preview.clone(),
                };
                Ok(Completion::Applied(preview))
            }
            Err(e) => {
                warn!(error = %e, "preview failed, back to idle");
                Err(WorkflowError::Preview(e))
            }
        }
    }

    /// `Previewed -> Confirming`. Returns the request captured at preview time.
    pub fn begin_confirm(&mut self) -> Result<(Ticket, CustomerRequest), WorkflowError> {
        let (request, preview) = match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Previewed { request, preview } => (request, preview),
            other => {
                self.state = other;
                return Err(self.invalid("confirm"));
            }
        };
        let ticket = self.issue_ticket();
        debug!(ticket, "previewed -> confirming");
        self.state = WorkflowState::Confirming {
            ticket,
            request: request.clone(),
            preview,
        };
        Ok((ticket, request))
    }

    /// `Confirming -> Confirmed` on success, `Confirming -> Previewed` on failure.
    pub fn complete_confirm(
        &mut self,
        ticket: Ticket,
        outcome: Result<ConfirmedResult, ServiceError>,
    ) -> Result<Completion<ConfirmedResult>, WorkflowError> {
        let (request, preview) = match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Confirming {
                ticket: current,
                request,
                preview,
            } if current == ticket => (request, preview),
            other => {
                debug!(ticket, state = other.name(), "ignoring stale confirm response");
                self.state = other;
                return Ok(Completion::Stale);
            }
        };

        match outcome {
            Ok(confirmed) => {
                if confirmed.customer_id != preview.customer_id {
                    warn!(
                        previewed = %preview.customer_id,
                        allocated = %confirmed.customer_id,
                        "allocated identifier differs from preview"
                    );
                }
                info!(customer_id = %confirmed.customer_id, "customer ID allocated");
                self.state = WorkflowState::Confirmed {
                    request,
                    confirmed: confirmed.clone(),
                };
                Ok(Completion::Applied(confirmed))
            }
            Err(e) => {
                warn!(error = %e, "confirm failed, preview kept");
                self.state = WorkflowState::Previewed { request, preview };
                Err(WorkflowError::Confirm(e))
            }
        }
    }

    /// `Previewed -> Idle` without touching the network. Returns the
    /// discarded preview.
    pub fn cancel(&mut self) -> Result<PreviewResult, WorkflowError> {
        match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Previewed { preview, .. } => {
                debug!(customer_id = %preview.customer_id, "preview cancelled");
                Ok(preview)
            }
            other => {
                self.state = other;
                Err(self.invalid("cancel"))
            }
        }
    }
}

impl<S: CustomerIdService> Workflow<S> {
    pub async fn submit(&mut self, selection: &FormSelection) -> Result<PreviewResult, WorkflowError> {
        let (ticket, request) = self.begin_preview(selection)?;
        let outcome = self.service.preview(&request).await;
        match self.complete_preview(ticket, outcome)? {
            Completion::Applied(preview) => Ok(preview),
            Completion::Stale => Err(WorkflowError::Superseded),
        }
    }

    pub async fn confirm(&mut self) -> Result<ConfirmedResult, WorkflowError> {
        let (ticket, request) = self.begin_confirm()?;
        let outcome = self.service.commit(&request).await;
        match self.complete_confirm(ticket, outcome)? {
            Completion::Applied(confirmed) => Ok(confirmed),
            Completion::Stale => Err(WorkflowError::Superseded),
        }
    }
}
