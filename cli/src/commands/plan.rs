use std::path::PathBuf;

use agentflow_core::api::AppConfig;

use super::cli::{PlanArgs, PlanFormat};
use super::validate::load_checked;
use crate::error::CliError;
use crate::render::format_plan_text;

pub async fn plan_cmd(
    args: PlanArgs,
    playbook_dir: Option<PathBuf>,
    cfg: &AppConfig,
) -> Result<i32, CliError> {
    let (_, plan) = load_checked(&args.playbook, playbook_dir, cfg).await?;
    match args.format {
        PlanFormat::Text => println!("{}", format_plan_text(&plan)),
        PlanFormat::Json => {
            let json = serde_json::to_string_pretty(&plan)
                .map_err(|e| CliError::Command(e.to_string()))?;
            println!("{json}");
        }
    }
    Ok(0)
}
