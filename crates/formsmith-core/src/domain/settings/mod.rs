//! Form settings and their dependency rules
use serde::{Deserialize, Serialize};

use crate::{FormsError, Result};

/// Response-collection settings of a form.
///
/// Two invariants hold after every [`FormSettings::apply`]:
/// - `send_response_copy_to_participants` implies `collect_emails`
/// - `require_login` implies `limit_to_one_response`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub collect_emails: bool,
    pub send_response_copy_to_participants: bool,
    pub require_login: bool,
    pub limit_to_one_response: bool,
    pub allow_response_editing: bool,
    pub show_progress_bar: bool,
    pub shuffle_questions: bool,
    pub confirmation_message: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            collect_emails: false,
            send_response_copy_to_participants: false,
            require_login: false,
            limit_to_one_response: false,
            allow_response_editing: false,
            show_progress_bar: true,
            shuffle_questions: false,
            confirmation_message: "Your response has been recorded.".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingChange {
    CollectEmails(bool),
    SendResponseCopy(bool),
    RequireLogin(bool),
    LimitToOneResponse(bool),
    AllowResponseEditing(bool),
    ShowProgressBar(bool),
    ShuffleQuestions(bool),
    ConfirmationMessage(String),
}

impl FormSettings {
    /// Apply one change, cascading dependent toggles.
    ///
    /// On rejection `self` is left untouched.
    pub fn apply(&mut self, change: SettingChange) -> Result<()> {
        match change {
            SettingChange::CollectEmails(on) => {
                self.collect_emails = on;
                if !on {
                    self.send_response_copy_to_participants = false;
                }
            }
            SettingChange::SendResponseCopy(true) if !self.collect_emails => {
                return Err(FormsError::SettingRejected(
                    "response copies need email collection enabled".into(),
                ));
            }
            SettingChange::SendResponseCopy(on) => self.send_response_copy_to_participants = on,
            SettingChange::RequireLogin(on) => {
                self.require_login = on;
                if on {
                    self.limit_to_one_response = true;
                }
            }
            SettingChange::LimitToOneResponse(false) if self.require_login => {
                return Err(FormsError::SettingRejected(
                    "one response per user is required while login is required".into(),
                ));
            }
            SettingChange::LimitToOneResponse(on) => self.limit_to_one_response = on,
            SettingChange::AllowResponseEditing(on) => self.allow_response_editing = on,
            SettingChange::ShowProgressBar(on) => self.show_progress_bar = on,
            SettingChange::ShuffleQuestions(on) => self.shuffle_questions = on,
            SettingChange::ConfirmationMessage(msg) => self.confirmation_message = msg,
        }
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        (!self.send_response_copy_to_participants || self.collect_emails)
            && (!self.require_login || self.limit_to_one_response)
    }

    /// Restore the invariants on settings that arrived from outside the editor.
    pub fn normalize(&mut self) {
        if !self.collect_emails {
            self.send_response_copy_to_participants = false;
        }
        if self.require_login {
            self.limit_to_one_response = true;
        }
    }
}
