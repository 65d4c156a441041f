//! One add-disk modal session.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result, SubmitError};
use crate::reducer::reduce;
use crate::results::{DiskResults, build_results};
use crate::state::{DiskFormEvent, DiskFormState};
use crate::validation::{DiskValidation, validate};

/// Persists the results of a submitted form.
#[allow(async_fn_in_trait)]
pub trait DiskSubmitter {
    /// Persists the disk, volume and any objects to create.
    ///
    /// The error message is shown to the user.
    async fn submit(&self, results: DiskResults) -> std::result::Result<(), SubmitError>;
}

/// Drives a [`DiskFormState`] from opening the modal to closing it.
#[derive(Debug)]
pub struct DiskModalSession {
    id: Uuid,
    state: DiskFormState,
    closed: bool,
}

impl DiskModalSession {
    /// Opens a session on `state`.
    #[must_use]
    pub fn new(state: DiskFormState) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, vm = %state.vm_name, "Opened disk modal");
        Self {
            id,
            state,
            closed: false,
        }
    }

    /// Session id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current form state.
    #[must_use]
    pub const fn state(&self) -> &DiskFormState {
        &self.state
    }

    /// Applies one event.
    pub fn dispatch(&mut self, event: DiskFormEvent) {
        if self.closed {
            debug!(session = %self.id, ?event, "Ignoring event on closed modal");
            return;
        }
        self.state = reduce(self.state.clone(), event);
    }

    /// Validates the current state.
    #[must_use]
    pub fn validation(&self) -> DiskValidation {
        validate(&self.state)
    }

    /// Whether inputs are enabled.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        !self.closed && self.state.is_editable()
    }

    /// Whether the modal has closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Error of the last rejected submit.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.state.phase.error()
    }

    /// Closes the modal without submitting.
    pub fn cancel(self) {
        debug!(session = %self.id, "Cancelled disk modal");
    }

    /// Builds the results and hands them to `submitter`.
    ///
    /// Inputs are disabled while the call is in flight. On success the modal
    /// closes; on failure the error is kept and inputs are enabled again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotEditable`] if the modal is closed or already
    /// submitting, [`Error::InvalidForm`] if the form does not validate and
    /// [`Error::Submit`] if the submitter rejects the disk.
    pub async fn submit<S: DiskSubmitter>(&mut self, submitter: &S) -> Result<DiskResults> {
        if self.closed {
            return Err(Error::NotEditable("closed"));
        }
        if !self.state.is_editable() {
            return Err(Error::NotEditable("submitting"));
        }
        let results = build_results(&self.state)?;

        self.dispatch(DiskFormEvent::SubmitStarted);
        match submitter.submit(results.clone()).await {
            Ok(()) => {
                self.dispatch(DiskFormEvent::SubmitSucceeded);
                self.closed = true;
                info!(
                    session = %self.id,
                    vm = %self.state.vm_name,
                    disk = %self.state.name,
                    "Added disk"
                );
                Ok(results)
            }
            Err(error) => {
                warn!(session = %self.id, error = %error, "Disk submit rejected");
                self.dispatch(DiskFormEvent::SubmitFailed(error.message.clone()));
                Err(Error::Submit(error))
            }
        }
    }
}
