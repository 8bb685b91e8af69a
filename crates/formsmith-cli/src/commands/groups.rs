//! Groups commands

use anyhow::Result;
use formsmith_client::Group;
use serde::Serialize;
use tabled::Tabled;

use super::{success, Env};
use crate::GroupCommands;

#[derive(Debug, Serialize, Tabled)]
pub struct GroupRow {
    pub id: String,
    pub name: String,
    pub created: String,
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            created: g.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn handle(action: GroupCommands, env: &Env) -> Result<()> {
    let client = env.ctx.client();
    match action {
        GroupCommands::List => {
            let groups = client.list_groups().await?;
            let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
            env.format.print_rows(&rows);
        }
        GroupCommands::Create { name } => {
            let group = client.create_group(&name).await?;
            success(format!("Created group {} ({})", group.name, group.id));
        }
        GroupCommands::Delete { id } => {
            client.delete_group(&id).await?;
            success(format!("Deleted group {} and its forms", id));
        }
    }
    Ok(())
}
