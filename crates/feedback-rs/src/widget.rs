//! The survey popup widget.
//!
//! [`SurveyWidget`] ties a [`PopupShell`] to a [`SubmissionCoordinator`] the
//! way the feedback button behaves on a page:
//!
//! - Opening the popup starts loading the CAPTCHA widget.
//! - Cancel, escape or a click outside closes it and resets any error,
//!   unless the survey was already submitted.
//! - A successful submit closes the popup if it was open when the attempt
//!   entered `processing`. A submitted survey cannot be reopened.
//! - Scroll and resize, and any transition into or out of `error`,
//!   reposition the open popup.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::debug;

use crate::components::{QuestionSlots, question_numbers};
use crate::config::{SUBMIT_LABEL, SUBMITTING_LABEL, WidgetConfig};
use crate::content::SurveyContent;
use crate::coordinator::{SubmissionCoordinator, SubmissionState};
use crate::error::ConfigError;
use crate::events::{FnObserver, SubmissionEvent};
use crate::question::QuestionType;
use crate::response::ResponseModel;
use crate::shell::{InteractionCallback, OutsideInteraction, Point, PopupLayout, PopupShell};

/// A feedback button with its survey popup.
pub struct SurveyWidget<C: SurveyContent> {
    config: WidgetConfig,
    coordinator: SubmissionCoordinator<C>,
    shell: Arc<Mutex<PopupShell>>,
}

impl<C: SurveyContent> SurveyWidget<C> {
    /// Wrap `coordinator`. The shell follows the coordinator's events for
    /// repositioning.
    pub fn new(config: WidgetConfig, coordinator: SubmissionCoordinator<C>, mut shell: PopupShell) -> Arc<Self> {
        shell.set_disabled(config.disabled);
        let shell = Arc::new(Mutex::new(shell));
        let follower = Arc::clone(&shell);
        let coordinator = coordinator.with_observer(FnObserver::new(move |event: &SubmissionEvent<'_>| {
            follower
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .on_submission_event(event);
        }));
        Arc::new(Self {
            config,
            coordinator,
            shell,
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SubmissionCoordinator<C> {
        &self.coordinator
    }

    pub fn button_text(&self) -> &str {
        &self.config.button_text
    }

    /// Label for the submit button in the current state.
    pub fn submit_label(&self) -> &'static str {
        if self.coordinator.state() == SubmissionState::Processing {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Whether the form controls should accept input.
    pub fn controls_enabled(&self) -> bool {
        !matches!(
            self.coordinator.state(),
            SubmissionState::Processing | SubmissionState::Submitted
        )
    }

    pub fn is_open(&self) -> bool {
        self.shell().is_open()
    }

    pub fn popup_origin(&self) -> Option<Point> {
        self.shell().origin()
    }

    pub fn set_layout(&self, layout: PopupLayout) {
        self.shell().set_layout(layout);
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.shell().set_disabled(disabled);
    }

    /// Open the popup. Returns `false` if the widget is disabled or the
    /// survey has already been submitted.
    pub fn open(self: &Arc<Self>) -> bool {
        let widget: Weak<Self> = Arc::downgrade(self);
        let callback: InteractionCallback = Arc::new(move |interaction| {
            if let Some(widget) = widget.upgrade() {
                widget.handle_interaction(interaction);
            }
        });
        let state = self.coordinator.state();
        let opened = self.shell().open(state, callback);
        if opened {
            self.coordinator.preload_captcha();
        }
        opened
    }

    /// Toggle the popup from the feedback button.
    pub fn toggle(self: &Arc<Self>) -> bool {
        if self.is_open() {
            self.cancel();
            false
        } else {
            self.open()
        }
    }

    /// Close the popup, resetting the submission state unless submitted.
    pub fn cancel(&self) {
        self.shell().close();
        if self.coordinator.state() != SubmissionState::Submitted {
            self.coordinator.reset();
        }
    }

    /// A click on the backdrop behind the popup.
    pub fn background_clicked(&self) {
        if self.is_open() {
            self.cancel();
        }
    }

    /// React to input outside the popup.
    pub fn handle_interaction(&self, interaction: OutsideInteraction) {
        match interaction {
            OutsideInteraction::Escape => {
                debug!("escape pressed, closing survey popup");
                self.cancel();
            }
            OutsideInteraction::Scroll | OutsideInteraction::Resize => self.shell().reposition(),
        }
    }

    /// Submit the survey. On success the popup closes if it was open when
    /// the attempt entered `processing`.
    pub async fn submit(&self) -> Result<SubmissionState, ConfigError> {
        let state = self.coordinator.submit().await?;
        if state == SubmissionState::Submitted {
            let mut shell = self.shell();
            if shell.was_open_when_processing() {
                shell.close();
            }
        }
        Ok(state)
    }

    fn shell(&self) -> MutexGuard<'_, PopupShell> {
        self.shell.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SurveyWidget<ResponseModel> {
    /// Display numbers, if question numbers are shown. Extras are never
    /// numbered.
    pub fn question_numbers(&self) -> Vec<Option<u32>> {
        let show = self.config.show_question_numbers;
        self.coordinator.with_content(|model| {
            question_numbers(
                model
                    .questions()
                    .map(|q| show && q.question_type() != QuestionType::Extra),
            )
        })
    }
}

impl SurveyWidget<QuestionSlots> {
    pub fn question_numbers(&self) -> Vec<Option<u32>> {
        let show = self.config.show_question_numbers;
        self.coordinator.with_content(|slots| {
            slots
                .numbers()
                .into_iter()
                .map(|n| n.filter(|_| show))
                .collect()
        })
    }
}
