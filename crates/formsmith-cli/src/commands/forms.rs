//! Forms commands

use anyhow::{bail, Context, Result};
use formsmith_client::{EditingSession, FormStore, FormSummary, SessionState, Submission};
use formsmith_core::{Field, FieldType, Form, FormEditor, Outcome, Template};
use serde::Serialize;
use std::collections::HashSet;
use tabled::Tabled;

use super::{print_notifications, success, Env};
use crate::output::OutputFormat;
use crate::FormCommands;

#[derive(Debug, Serialize, Tabled)]
pub struct FormRow {
    pub id: String,
    pub title: String,
    pub group: String,
    pub pages: usize,
    pub fields: usize,
    pub responses: usize,
    pub views: usize,
    pub updated: String,
}

impl From<&FormSummary> for FormRow {
    fn from(s: &FormSummary) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            group: if s.group_id.is_empty() { "-".into() } else { s.group_id.clone() },
            pages: s.page_count,
            fields: s.field_count,
            responses: s.submission_count,
            views: s.view_count,
            updated: s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct FieldRow {
    pub page: usize,
    #[tabled(rename = "#")]
    pub position: usize,
    pub id: String,
    #[tabled(rename = "type")]
    pub field_type: String,
    pub label: String,
    pub required: bool,
}

pub fn field_rows(form: &Form) -> Vec<FieldRow> {
    form.pages
        .iter()
        .enumerate()
        .flat_map(|(pi, page)| {
            page.fields.iter().enumerate().map(move |(fi, field)| FieldRow {
                page: pi + 1,
                position: fi + 1,
                id: field.id.clone(),
                field_type: field.field_type.to_string(),
                label: field.label.clone(),
                required: field.required,
            })
        })
        .collect()
}

#[derive(Debug, Serialize, Tabled)]
pub struct ResponseRow {
    pub id: String,
    pub submitted: String,
    pub email: String,
    pub answers: usize,
}

impl From<&Submission> for ResponseRow {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id.clone(),
            submitted: s.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            email: s.email.clone().unwrap_or_else(|| "-".into()),
            answers: s.answers.len(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct TemplateRow {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub async fn handle(action: FormCommands, env: &Env) -> Result<()> {
    let client = env.ctx.client();
    match action {
        FormCommands::List { group } => {
            let forms = client.list_forms(group.as_deref()).await?;
            let rows: Vec<FormRow> = forms.iter().map(FormRow::from).collect();
            env.format.print_rows(&rows);
        }
        FormCommands::Get { id } => {
            let form = client.get_form(&id).await?;
            match env.format {
                OutputFormat::Table => {
                    println!("{} ({} page(s))", form.title, form.page_count());
                    env.format.print_rows(&field_rows(&form));
                }
                _ => env.format.print(&form),
            }
        }
        FormCommands::New { template, title, group } => {
            let mut session = env.ctx.new_session(template, &group);
            if let Some(title) = title {
                session.edit(|editor| editor.set_title(title));
            }
            save(&mut session).await?;
            let id = session.form().id.clone().unwrap_or_default();
            success(format!("Created form {} from the {} template", id, template));
        }
        FormCommands::AddField { id, field_type, label, after, page, required } => {
            let mut session = open(env, &id).await?;
            let spec = NewField { field_type, label, after, page, required };
            let field_id = match session.edit(|editor| spec.apply(editor)) {
                Some(Ok(field_id)) => field_id,
                Some(Err(e)) => return Err(e),
                None => bail!("form {} is not editable", id),
            };
            save(&mut session).await?;
            success(format!("Added {} field {}", field_type, field_id));
        }
        FormCommands::Export { id, output, with_responses } => {
            let (file_name, body) = if with_responses {
                let export = client.export_form(&id).await?;
                (format!("{}-responses.json", id), serde_json::to_string_pretty(&export)?)
            } else {
                let session = open(env, &id).await?;
                let doc = session.export()?;
                (doc.file_name, doc.body)
            };
            let path = output.unwrap_or(file_name);
            std::fs::write(&path, body).with_context(|| format!("writing {}", path))?;
            success(format!("Exported to {}", path));
        }
        FormCommands::Delete { id } => {
            client.delete_form(&id).await?;
            success(format!("Deleted form {}", id));
        }
        FormCommands::Rename { id, title } => {
            let form = client.rename_form(&id, &title).await?;
            success(format!("Renamed to \"{}\"", form.title));
        }
        FormCommands::Duplicate { id } => {
            let copy = client.duplicate_form(&id).await?;
            success(format!(
                "Created {} \"{}\"",
                copy.id.as_deref().unwrap_or("-"),
                copy.title
            ));
        }
        FormCommands::Share { id } => {
            let link = client.share_form(&id).await?;
            match env.format {
                OutputFormat::Table => println!("{}", link.url),
                _ => env.format.print(&link),
            }
        }
        FormCommands::Responses { id } => {
            let responses = client.list_submissions(&id).await?;
            match env.format {
                OutputFormat::Table => {
                    let rows: Vec<ResponseRow> = responses.iter().map(ResponseRow::from).collect();
                    env.format.print_rows(&rows);
                }
                _ => env.format.print(&responses),
            }
        }
        FormCommands::Templates => {
            let rows: Vec<TemplateRow> = Template::ALL
                .into_iter()
                .map(|t| TemplateRow { name: t.slug(), title: t.title(), description: t.description() })
                .collect();
            env.format.print_rows(&rows);
        }
    }
    Ok(())
}

async fn open(env: &Env, id: &str) -> Result<EditingSession<formsmith_client::FormsClient>> {
    let mut session = env.ctx.open_session(id).await;
    let notifications = session.take_notifications();
    if let SessionState::LoadError(message) = session.state() {
        bail!("could not load form {}: {}", id, message);
    }
    if let SessionState::SessionExpired { .. } = session.state() {
        print_notifications(notifications);
        bail!("session expired (run `formsmith login` to sign in again)");
    }
    Ok(session)
}

async fn save<S: FormStore>(session: &mut EditingSession<S>) -> Result<()> {
    let result = session.save().await;
    let notifications = session.take_notifications();
    if result.is_err() {
        print_notifications(notifications);
    }
    Ok(result?)
}

/// A field requested from the command line
struct NewField {
    field_type: FieldType,
    label: Option<String>,
    after: Option<String>,
    page: Option<usize>,
    required: bool,
}

impl NewField {
    /// Add the field and return its id
    fn apply(self, editor: &mut FormEditor) -> Result<String> {
        let before: HashSet<String> = editor.form().fields().map(|f| f.id.clone()).collect();

        if let Some(page) = self.page {
            if page == 0 || !editor.set_active_page(page - 1).is_applied() {
                bail!("page {} does not exist (form has {})", page, editor.form().page_count());
            }
        }
        let outcome = match &self.after {
            Some(after) => {
                let Some((page_index, _)) = editor.form().locate(after) else {
                    bail!("no field {} in this form", after);
                };
                editor.set_active_page(page_index);
                editor.add_field_after(after, self.field_type)
            }
            None => editor.add_field(self.field_type),
        };
        if let Outcome::Ignored(reason) = outcome {
            bail!("field not added: {}", reason);
        }

        let added: Field = editor
            .form()
            .fields()
            .find(|f| !before.contains(&f.id))
            .cloned()
            .context("added field not found")?;

        if self.label.is_some() || self.required {
            let mut updated = added.clone();
            if let Some(label) = self.label {
                updated.label = label;
            }
            updated.required = self.required;
            editor.update_field(&added.id, updated);
        }
        Ok(added.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_field_after_existing() {
        let mut form = Form::new("T", "");
        let first = Field::labeled(FieldType::Text, "First");
        let last = Field::labeled(FieldType::Text, "Last");
        form.page_mut(0).unwrap().fields = vec![first.clone(), last];
        let mut editor = FormEditor::new(form);

        let spec = NewField {
            field_type: FieldType::Email,
            label: Some("Email".into()),
            after: Some(first.id.clone()),
            page: None,
            required: true,
        };
        let id = spec.apply(&mut editor).unwrap();

        let page = editor.form().page(0).unwrap();
        assert_eq!(page.position(&id), Some(1));
        let field = page.field(&id).unwrap();
        assert_eq!(field.label, "Email");
        assert!(field.required);
    }

    #[test]
    fn test_new_field_on_missing_page_fails() {
        let mut editor = FormEditor::new(Form::new("T", ""));
        let spec = NewField {
            field_type: FieldType::Text,
            label: None,
            after: None,
            page: Some(3),
            required: false,
        };
        assert!(spec.apply(&mut editor).is_err());
        assert_eq!(editor.form().field_count(), 0);
    }

    #[test]
    fn test_field_rows_are_one_based() {
        let mut form = Form::new("T", "");
        form.page_mut(0).unwrap().fields.push(Field::new(FieldType::Date));
        let rows = field_rows(&form);
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].page, rows[0].position), (1, 1));
        assert_eq!(rows[0].field_type, "date");
    }
}
