use crate::cli::args::{CliArgs, Command};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.lang.as_deref() {
        crate::i18n::Locale::parse(raw)
            .ok_or_else(|| format!("invalid --lang '{raw}', expected en or zh-TW"))?;
    }
    if let Some(raw) = args.url.as_deref() {
        reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --url '{raw}': {e}"))?;
    }

    match &args.command {
        Command::Generate(generate) => {
            if let Some(raw) = generate.branch_handling.as_deref() {
                crate::workflow::BranchHandling::parse(raw).ok_or_else(|| {
                    format!(
                        "invalid --branch-handling '{raw}', expected issue-own-invoice-number or assign-sequential-branch-number"
                    )
                })?;
            }
        }
        Command::Query(query) => {
            if query.company_name.trim().is_empty() {
                return Err("company name must not be empty".to_string());
            }
            if let Some(0) = query.page_size {
                return Err("invalid page-size, expected positive integer".to_string());
            }
            if let Some(raw) = query.format.as_deref() {
                crate::output::OutputFormat::parse(raw)
                    .ok_or_else(|| format!("invalid --format '{raw}', expected text or json"))?;
            }
        }
        Command::Update(update) => {
            let has_company = update
                .company_name
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty());
            let has_branch = update
                .branch_name
                .as_deref()
                .is_some_and(|v| !v.trim().is_empty());
            if !has_company && !has_branch {
                return Err("update needs --company and/or --branch".to_string());
            }
        }
        Command::Options
        | Command::Delete(_)
        | Command::Search(_)
        | Command::Export(_)
        | Command::Import(_)
        | Command::Init => {}
    }
    Ok(())
}
