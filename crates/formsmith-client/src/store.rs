//! Persistence seam used by editing sessions

use async_trait::async_trait;
use formsmith_core::Form;

use crate::client::FormsClient;
use crate::Result;

/// Where an editing session saves to and loads from.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// First save of a form that already carries its client-generated id
    async fn create(&self, form: &Form) -> Result<Form>;

    async fn update(&self, id: &str, form: &Form) -> Result<Form>;

    async fn fetch(&self, id: &str) -> Result<Form>;
}

#[async_trait]
impl FormStore for FormsClient {
    async fn create(&self, form: &Form) -> Result<Form> {
        self.create_form(form).await
    }

    async fn update(&self, id: &str, form: &Form) -> Result<Form> {
        self.update_form(id, form).await
    }

    async fn fetch(&self, id: &str) -> Result<Form> {
        self.get_form(id).await
    }
}
