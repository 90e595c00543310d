use crate::commands::Context;
use crate::display::{convert_size, get_display_data_single, Output, Record, Value};
use crate::error::ClientError;
use crate::provider::StorageProvider;
use clap::Args;

/// Shows information about the current user's account.
#[derive(Debug, Clone, Default, Args)]
pub struct AccountInfoShow {
    /// Show information about the account in more detail
    #[arg(short, long)]
    pub all: bool,
}

impl AccountInfoShow {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let account = provider
            .current_account()
            .await
            .map_err(|e| ClientError::action("whoami: cannot get account information", e))?;

        let mut columns = vec!["user", "e_mail", "country"];
        let mut data = Record::from([
            ("user", Value::from(account.name.display_name)),
            ("e_mail", Value::from(account.email)),
            ("country", Value::from(account.country)),
        ]);

        if self.all {
            columns.extend(["account_id", "team", "team_member_id"]);
            data.insert("account_id", Value::from(account.account_id));
            data.insert("team", Value::from(account.team.map(|t| t.name)));
            data.insert("team_member_id", Value::from(account.team_member_id));
        }

        let row = get_display_data_single(&columns, &data, &Value::Null);
        Ok(Output::Show { columns, row })
    }
}

/// Shows space usage of the current user's account.
#[derive(Debug, Clone, Default, Args)]
pub struct SpaceUsageShow {}

impl SpaceUsageShow {
    pub async fn execute(
        &self,
        provider: &impl StorageProvider,
        _ctx: &Context,
    ) -> Result<Output, ClientError> {
        let usage = provider
            .space_usage()
            .await
            .map_err(|e| ClientError::action("df: cannot get space usage", e))?;

        let columns = vec!["allocated", "used", "available"];
        let mut data = Record::new();

        match usage.allocated() {
            Some(allocated) if allocated > 0 => {
                let available = allocated.saturating_sub(usage.used);
                let percent = usage.used as f64 * 100.0 / allocated as f64;
                data.insert("allocated", Value::from(convert_size(allocated)));
                data.insert(
                    "used",
                    Value::from(format!("{} ({:.2}%)", convert_size(usage.used), percent)),
                );
                data.insert("available", Value::from(convert_size(available)));
            }
            _ => {
                data.insert("used", Value::from(convert_size(usage.used)));
            }
        }

        let row = get_display_data_single(&columns, &data, &Value::Null);
        Ok(Output::Show { columns, row })
    }
}
