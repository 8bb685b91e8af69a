//! Starter templates for new forms

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::aggregates::{Form, Page};
use crate::domain::settings::SettingChange;
use crate::domain::value_objects::{Field, FieldType, FieldValidation};
use crate::FormsError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    Blank,
    ContactForm,
    Quiz,
    Survey,
    Registration,
    Feedback,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Template::Blank,
        Template::ContactForm,
        Template::Quiz,
        Template::Survey,
        Template::Registration,
        Template::Feedback,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Template::Blank => "blank",
            Template::ContactForm => "contact",
            Template::Quiz => "quiz",
            Template::Survey => "survey",
            Template::Registration => "registration",
            Template::Feedback => "feedback",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Template::Blank => "Untitled Form",
            Template::ContactForm => "Contact Us",
            Template::Quiz => "Quiz",
            Template::Survey => "Survey",
            Template::Registration => "Event Registration",
            Template::Feedback => "Feedback",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Template::Blank => "",
            Template::ContactForm => "Get in touch and we'll get back to you.",
            Template::Quiz => "Test your knowledge.",
            Template::Survey => "Tell us what you think.",
            Template::Registration => "Reserve your spot.",
            Template::Feedback => "Help us improve.",
        }
    }

    fn fields(self) -> Vec<Field> {
        match self {
            Template::Blank => Vec::new(),
            Template::ContactForm => vec![
                Field::labeled(FieldType::Text, "Name").required(),
                Field::labeled(FieldType::Email, "Email").required().with_placeholder("you@example.com"),
                Field::labeled(FieldType::Textarea, "Message").required(),
            ],
            Template::Quiz => vec![
                Field::labeled(FieldType::Text, "Name").required(),
                Field::labeled(FieldType::Radio, "Question 1").required().with_options(["A", "B", "C", "D"]),
                Field::labeled(FieldType::Radio, "Question 2").required().with_options(["True", "False"]),
                Field::labeled(FieldType::Checkbox, "Question 3").with_options(["A", "B", "C"]),
            ],
            Template::Survey => vec![
                Field::labeled(FieldType::Radio, "How satisfied are you?").required().with_options([
                    "Very satisfied",
                    "Satisfied",
                    "Neutral",
                    "Unsatisfied",
                ]),
                Field::labeled(FieldType::Select, "How did you hear about us?").with_options([
                    "Search",
                    "Social media",
                    "Friend",
                    "Other",
                ]),
                Field::labeled(FieldType::Textarea, "Anything else?"),
            ],
            Template::Registration => vec![
                Field::labeled(FieldType::Text, "Full name").required(),
                Field::labeled(FieldType::Email, "Email").required(),
                Field::labeled(FieldType::Date, "Date of birth"),
                Field::labeled(FieldType::Select, "Ticket type").required().with_options(["Standard", "VIP"]),
            ],
            Template::Feedback => {
                let mut rating = Field::labeled(FieldType::Number, "Rating (1-5)").required();
                rating.validation = Some(FieldValidation {
                    min: Some(1.0),
                    max: Some(5.0),
                    ..Default::default()
                });
                vec![
                    rating,
                    Field::labeled(FieldType::Textarea, "What went well?"),
                    Field::labeled(FieldType::Textarea, "What could be better?"),
                    Field::labeled(FieldType::File, "Screenshot"),
                ]
            }
        }
    }

    fn settings(self) -> Vec<SettingChange> {
        match self {
            Template::Quiz => vec![SettingChange::CollectEmails(true), SettingChange::ShowProgressBar(true)],
            Template::Registration => vec![
                SettingChange::CollectEmails(true),
                SettingChange::SendResponseCopy(true),
                SettingChange::RequireLogin(true),
            ],
            Template::Survey => vec![SettingChange::AllowResponseEditing(true)],
            _ => Vec::new(),
        }
    }

    /// Build a fresh, unsaved form seeded from this template.
    pub fn instantiate(self, group_id: impl Into<String>) -> Form {
        let mut form = Form::new(self.title(), group_id);
        form.description = self.description().to_string();
        form.pages = vec![Arc::new(Page::numbered(1).with_fields(self.fields()))];
        for change in self.settings() {
            if let Err(err) = form.settings.apply(change) {
                tracing::warn!(template = self.slug(), %err, "template setting skipped");
            }
        }
        form
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Template {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Template::ALL
            .into_iter()
            .find(|t| t.slug() == wanted)
            .ok_or_else(|| FormsError::UnknownTemplate(s.to_string()))
    }
}
