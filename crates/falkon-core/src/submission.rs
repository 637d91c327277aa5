//! Contact form submission shim.
//!
//! [`ContactForm`] owns the three field values and the feedback state that a
//! form UI renders:
//!
//! ```text
//! Idle ──begin──▶ Submitting ──ok──▶ Succeeded { until } ──5s──▶ Idle
//!                     ├──err──▶ Failed
//!                     └──dropped──▶ Idle
//! ```
//!
//! On success the fields are cleared and a confirmation is shown for
//! [`CONFIRMATION_WINDOW`]. On failure the error is logged and the fields are
//! kept so the user can retry. Empty fields are rejected before anything is
//! sent. There is no backoff and no queue of failed submissions.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::error::{ServiceError, SubmitError};
use crate::message::{MessageId, NewMessage};
use crate::service::MessageService;

/// How long the success confirmation stays visible.
pub const CONFIRMATION_WINDOW: Duration = Duration::from_secs(5);

/// A form field, for validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Message,
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        })
    }
}

/// Feedback state of a contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing in flight, no feedback shown.
    Idle,
    /// A send is in flight.
    Submitting,
    /// The last send succeeded; confirmation shown until `until`.
    Succeeded { id: MessageId, until: Instant },
    /// The last send failed.
    Failed { reason: String },
}

/// Field values plus submission state of one contact form.
#[derive(Debug, Clone)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    state: SubmissionState,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            message: String::new(),
            state: SubmissionState::Idle,
        }
    }
}

impl ContactForm {
    /// An empty, idle form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle form pre-filled with the given values.
    #[must_use]
    pub fn with_fields(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            state: SubmissionState::Idle,
        }
    }

    /// Current state, without expiring the confirmation window.
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Current state as of `now`. An elapsed confirmation reads back as
    /// [`SubmissionState::Idle`].
    pub fn state_at(&mut self, now: Instant) -> &SubmissionState {
        if let SubmissionState::Succeeded { until, .. } = self.state {
            if now >= until {
                self.state = SubmissionState::Idle;
            }
        }
        &self.state
    }

    /// Whether all three fields are empty.
    pub fn is_cleared(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.message.is_empty()
    }

    /// Validate the fields and enter [`SubmissionState::Submitting`].
    ///
    /// Returns the payload to send. Validation failures leave the state and
    /// the fields untouched.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::InFlight`] if a submission is already in progress.
    /// - [`SubmitError::MissingField`] if any field is blank.
    pub fn begin(&mut self) -> Result<NewMessage, SubmitError> {
        if self.state == SubmissionState::Submitting {
            return Err(SubmitError::InFlight);
        }
        for (field, value) in [
            (FormField::Name, &self.name),
            (FormField::Email, &self.email),
            (FormField::Message, &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(SubmitError::MissingField(field));
            }
        }

        self.state = SubmissionState::Submitting;
        Ok(NewMessage::new(
            self.name.clone(),
            self.email.clone(),
            self.message.clone(),
        ))
    }

    /// Apply the outcome of a send started with [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Send`] carrying the service error on failure.
    pub fn finish(
        &mut self,
        outcome: Result<MessageId, ServiceError>,
        now: Instant,
    ) -> Result<MessageId, SubmitError> {
        match outcome {
            Ok(id) => {
                info!(id = %id, "contact message sent");
                self.name.clear();
                self.email.clear();
                self.message.clear();
                self.state = SubmissionState::Succeeded {
                    id,
                    until: now + CONFIRMATION_WINDOW,
                };
                Ok(id)
            }
            Err(err) => {
                error!(error = %err, "error sending contact message");
                self.state = SubmissionState::Failed {
                    reason: err.to_string(),
                };
                Err(SubmitError::Send(err))
            }
        }
    }

    /// Validate, send through `service`, and apply the outcome.
    ///
    /// `now` anchors the confirmation window and should be taken when the
    /// send completes.
    ///
    /// If the returned future is dropped before the send completes, the form
    /// goes back to [`SubmissionState::Idle`] with its fields intact.
    ///
    /// # Errors
    ///
    /// See [`begin`](Self::begin) and [`finish`](Self::finish).
    pub async fn submit(
        &mut self,
        service: &dyn MessageService,
        now: impl FnOnce() -> Instant,
    ) -> Result<MessageId, SubmitError> {
        let payload = self.begin()?;
        let guard = InFlight { form: self };
        let outcome = service.send_message(payload).await;
        guard.form.finish(outcome, now())
    }
}

/// Leaves `Submitting` when a send is abandoned mid-flight.
struct InFlight<'a> {
    form: &'a mut ContactForm,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.form.state == SubmissionState::Submitting {
            warn!("contact message send cancelled");
            self.form.state = SubmissionState::Idle;
        }
    }
}
