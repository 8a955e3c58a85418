use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::autocomplete::Autocomplete;
use crate::cli::args::{
    CliArgs, Command, DeleteArgs, ExportArgs, GenerateArgs, ImportArgs, QueryArgs, SearchArgs,
    UpdateArgs,
};
use crate::cli::prompt::Prompt;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::i18n::{self, Locale, Message};
use crate::output::{self, OutputFormat, DEFAULT_PAGE_SIZE};
use crate::service::{
    ClientOptions, FormOptions, HttpService, ServiceError, SuggestContext, UpdateRequest,
};
use crate::workflow::view::{self, Action};
use crate::workflow::{
    BranchHandling, CategoryPolicy, FormSelection, ValidationError, Workflow, WorkflowError,
};

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validation_message(locale: Locale, err: ValidationError) -> &'static str {
    match err {
        ValidationError::MissingCompanyName => i18n::text(locale, Message::MissingCompanyName),
        ValidationError::MissingBranchName => i18n::text(locale, Message::MissingBranchName),
    }
}

fn service_message(locale: Locale, err: &ServiceError) -> String {
    if err.is_not_found() {
        i18n::text(locale, Message::CustomerIdNotFound).to_string()
    } else {
        err.to_string()
    }
}

/// Delete and update address a single row; a blank ID would hit the
/// collection path instead.
fn require_customer_id(locale: Locale, command: &Command) -> Result<(), String> {
    let customer_id = match command {
        Command::Delete(args) => &args.customer_id,
        Command::Update(args) => &args.customer_id,
        _ => return Ok(()),
    };
    if customer_id.trim().is_empty() {
        return Err(i18n::text(locale, Message::CustomerIdRequired).to_string());
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("custid={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    no_color: bool,
    page_size: usize,
    locale: Locale,
    policy: CategoryPolicy,
    config_path: Option<PathBuf>,
    command: Command,
}

fn build_run_config(
    args: CliArgs,
    cfg: ConfigFile,
    config_path: Option<PathBuf>,
) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = non_empty(args.url)
        .or(non_empty(cfg.base_url))
        .unwrap_or_else(|| crate::service::http::DEFAULT_BASE_URL.to_string());
    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(crate::service::http::DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = non_empty(args.proxy).or(non_empty(cfg.proxy));

    let page_size = cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }

    let lang = args.lang.or(cfg.lang).unwrap_or_else(|| "en".to_string());
    let locale =
        Locale::parse(&lang).ok_or_else(|| format!("invalid lang '{lang}', expected en or zh-TW"))?;

    require_customer_id(locale, &args.command)?;

    let policy = cfg.categories.unwrap_or_default().into_policy();

    Ok(RunConfig {
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy,
        },
        no_color,
        page_size,
        locale,
        policy,
        config_path,
        command: args.command,
    })
}

/// Takes a value from the command line or asks for it; either way it must be
/// one of `options` when the service offered any.
fn pick_listed<R: BufRead, W: Write>(
    label: &str,
    given: Option<String>,
    options: &[String],
    prompt: &mut Option<Prompt<R, W>>,
) -> Result<String, String> {
    if let Some(value) = non_empty(given) {
        if options.is_empty() || options.iter().any(|o| o == &value) {
            return Ok(value);
        }
        return Err(format!(
            "unknown {label} '{value}', expected one of: {}",
            options.join(", ")
        ));
    }
    match prompt.as_mut() {
        Some(p) if !options.is_empty() => p
            .choose(label, options, false)
            .map(|v| v.unwrap_or_default())
            .map_err(|e| format!("failed to read {label}: {e}")),
        Some(p) => p
            .ask(label)
            .map_err(|e| format!("failed to read {label}: {e}")),
        None => Err(format!("--{label} is required when prompting is disabled")),
    }
}

fn ask_text<R: BufRead, W: Write>(
    label: &str,
    given: Option<String>,
    prompt: &mut Option<Prompt<R, W>>,
) -> Result<String, String> {
    if let Some(value) = non_empty(given) {
        return Ok(value);
    }
    match prompt.as_mut() {
        Some(p) => p
            .ask(label)
            .map_err(|e| format!("failed to read {label}: {e}")),
        None => Ok(String::new()),
    }
}

/// Fills a [`FormSelection`] from flags and prompts. Only fields the category
/// makes active are asked for; flags for inactive fields are dropped.
fn collect_selection<R: BufRead, W: Write>(
    policy: &CategoryPolicy,
    options: &FormOptions,
    args: GenerateArgs,
    prompt: &mut Option<Prompt<R, W>>,
) -> Result<FormSelection, String> {
    let mut selection = FormSelection {
        region: pick_listed("region", args.region, &options.regions, prompt)?,
        ..FormSelection::default()
    };
    let category = pick_listed("category", args.category, &options.categories, prompt)?;
    let mut active = selection.set_category(&category, policy);
    selection.company_name = ask_text("company", args.company_name, prompt)?;

    if active.branch_handling {
        let mode = match non_empty(args.branch_handling) {
            Some(raw) => BranchHandling::parse(&raw)
                .ok_or_else(|| format!("invalid branch handling '{raw}'"))?,
            None => match prompt.as_mut() {
                Some(p) => {
                    let modes: Vec<String> = BranchHandling::ALL
                        .iter()
                        .map(|m| m.as_str().to_string())
                        .collect();
                    p.choose("branch handling", &modes, true)
                        .map_err(|e| format!("failed to read branch handling: {e}"))?
                        .and_then(|v| BranchHandling::parse(&v))
                        .unwrap_or_default()
                }
                None => BranchHandling::default(),
            },
        };
        active = selection.set_branch_handling(mode, policy);
    } else if args.branch_handling.is_some() {
        warn!("--branch-handling ignored for category '{category}'");
    }

    if active.extra_region_code {
        selection.extra_region_code = match non_empty(args.extra_region_code) {
            Some(v) => v,
            None => match prompt.as_mut() {
                Some(p) if !options.extra_region_codes.is_empty() => p
                    .choose("extra region code", &options.extra_region_codes, true)
                    .map_err(|e| format!("failed to read extra region code: {e}"))?
                    .unwrap_or_default(),
                Some(p) => p
                    .ask("extra region code")
                    .map_err(|e| format!("failed to read extra region code: {e}"))?,
                None => String::new(),
            },
        };
    } else if args.extra_region_code.is_some() {
        warn!("--extra-region-code ignored for category '{category}'");
    }

    if active.branch_name {
        selection.branch_name = ask_text("branch", args.branch_name, prompt)?;
    } else if args.branch_name.is_some() {
        warn!("--branch ignored for this category and branch handling");
    }

    let fields: Vec<&str> = active.iter().map(|f| f.as_str()).collect();
    debug!(?selection, ?fields, "form collected");
    Ok(selection)
}

async fn show_options(service: &HttpService) -> Result<(), String> {
    let pb = spinner("loading options");
    let loaded = service.load_options().await;
    pb.finish_and_clear();
    let options = loaded.map_err(|e| e.to_string())?;
    format_kv_line("Regions", &options.regions.join(", "));
    format_kv_line("Categories", &options.categories.join(", "));
    format_kv_line("Extra codes", &options.extra_region_codes.join(", "));
    Ok(())
}

async fn generate(run: &RunConfig, service: HttpService, args: GenerateArgs) -> Result<(), String> {
    let locale = run.locale;
    let pb = spinner("loading options");
    let loaded = service.load_options().await;
    pb.finish_and_clear();
    let options = loaded.map_err(|e| e.to_string())?;

    let auto_confirm = args.yes;
    let preview_only = args.preview_only;
    let mut prompt = if args.no_input {
        None
    } else {
        Some(Prompt::stdio())
    };
    let selection = collect_selection(&run.policy, &options, args, &mut prompt)?;

    let mut workflow = Workflow::new(service, run.policy.clone());
    let pb = spinner(i18n::text(locale, Message::RequestingPreview));
    let submitted = workflow.submit(&selection).await;
    pb.finish_and_clear();
    match submitted {
        Ok(_) => {}
        Err(WorkflowError::Validation(e)) => return Err(validation_message(locale, e).to_string()),
        Err(e) => return Err(e.to_string()),
    }
    println!("{}", view::render(&view::project(workflow.state()), locale));

    loop {
        let action = if auto_confirm {
            Action::Confirm
        } else if preview_only {
            Action::Cancel
        } else {
            match prompt.as_mut() {
                Some(p) => p
                    .decide(i18n::text(locale, Message::DecisionPrompt))
                    .map_err(|e| format!("failed to read decision: {e}"))?,
                None => Action::Cancel,
            }
        };

        match action {
            Action::Cancel => {
                workflow.cancel().map_err(|e| e.to_string())?;
                println!("{}", i18n::text(locale, Message::Cancelled).yellow());
                return Ok(());
            }
            Action::Confirm => {
                let pb = spinner(i18n::text(locale, Message::Committing));
                let confirmed = workflow.confirm().await;
                pb.finish_and_clear();
                match confirmed {
                    Ok(_) => {
                        println!("{}", view::render(&view::project(workflow.state()), locale));
                        return Ok(());
                    }
                    Err(e) if auto_confirm || prompt.is_none() => return Err(e.to_string()),
                    Err(e) => {
                        eprintln!("{} {}", "error:".bold().red(), e);
                        println!("{}", view::render(&view::project(workflow.state()), locale));
                        eprintln!("{}", i18n::text(locale, Message::RetryHint).yellow());
                    }
                }
            }
        }
    }
}

async fn query(run: &RunConfig, service: &HttpService, args: QueryArgs) -> Result<(), String> {
    let pb = spinner("querying");
    let result = service.query_by_name(args.company_name.trim()).await;
    pb.finish_and_clear();
    let rows = result.map_err(|e| service_message(run.locale, &e))?;

    let page_size = args.page_size.unwrap_or(run.page_size);
    let format = args
        .format
        .as_deref()
        .and_then(OutputFormat::parse)
        .unwrap_or(OutputFormat::Text);

    let pages: Vec<usize> = if args.all {
        (1..=rows.len().div_ceil(page_size.max(1))).collect()
    } else {
        vec![args.page]
    };

    let mut stdout = tokio::io::stdout();
    for n in pages {
        let page = output::paginate(&rows, n, page_size);
        let rendered = match format {
            OutputFormat::Text => output::render_text(&page),
            OutputFormat::Json => output::render_json(&page, rows.len())
                .map_err(|e| format!("failed to encode output: {e}"))?,
        };
        stdout
            .write_all(&rendered)
            .await
            .map_err(|e| format!("failed to write output: {e}"))?;
    }
    stdout
        .flush()
        .await
        .map_err(|e| format!("failed to write output: {e}"))?;
    Ok(())
}

async fn delete(run: &RunConfig, service: &HttpService, args: DeleteArgs) -> Result<(), String> {
    let customer_id = args.customer_id.trim();
    if !args.yes {
        let question = format!(
            "{} {}?",
            i18n::text(run.locale, Message::DeletePrompt),
            customer_id
        );
        let sure = Prompt::stdio()
            .yes_no(&question)
            .map_err(|e| format!("failed to read confirmation: {e}"))?;
        if !sure {
            println!("{}", i18n::text(run.locale, Message::Aborted));
            return Ok(());
        }
    }
    let detail = service
        .delete_by_id(customer_id)
        .await
        .map_err(|e| service_message(run.locale, &e))?;
    println!("{}", detail.green());
    Ok(())
}

async fn update(run: &RunConfig, service: &HttpService, args: UpdateArgs) -> Result<(), String> {
    let request = UpdateRequest {
        new_company_name: non_empty(args.company_name),
        new_branch_name: non_empty(args.branch_name),
    };
    let detail = service
        .update_by_id(args.customer_id.trim(), &request)
        .await
        .map_err(|e| service_message(run.locale, &e))?;
    println!("{}", detail.green());
    Ok(())
}

async fn search(run: &RunConfig, service: HttpService, args: SearchArgs) -> Result<(), String> {
    let context = SuggestContext {
        region: non_empty(args.region),
        category: non_empty(args.category),
        company_name: non_empty(args.company_name),
    };
    let mut completer = Autocomplete::new(service, args.kind);
    let items = completer
        .lookup(&args.keyword, &context)
        .await
        .map_err(|e| e.to_string())?;
    if items.is_empty() {
        println!("{}", i18n::text(run.locale, Message::NoSuggestions).dimmed());
    } else {
        print!("{}", output::render_suggestions(items));
    }
    Ok(())
}

async fn export(run: &RunConfig, service: &HttpService, args: ExportArgs) -> Result<(), String> {
    let path = config::expand_tilde(&args.output);
    let pb = spinner("exporting");
    let bytes = service.export_excel().await;
    pb.finish_and_clear();
    let bytes = bytes.map_err(|e| e.to_string())?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    println!(
        "{} {} ({} bytes)",
        i18n::text(run.locale, Message::ExportSaved),
        path.display().to_string().cyan(),
        bytes.len()
    );
    Ok(())
}

async fn import(service: &HttpService, args: ImportArgs) -> Result<(), String> {
    let path = config::expand_tilde(&args.file);
    let contents = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "customer_ids.xlsx".to_string());
    let pb = spinner("importing");
    let detail = service.import_excel(&file_name, contents).await;
    pb.finish_and_clear();
    println!("{}", detail.map_err(|e| e.to_string())?.green());
    Ok(())
}

fn init_config(run: &RunConfig) -> Result<(), String> {
    let path = run
        .config_path
        .clone()
        .ok_or_else(|| "could not determine a config path, pass --config".to_string())?;
    if config::ensure_default_config_file(&path)? {
        format_kv_line("Config", &format!("written {}", path.display()));
    } else {
        format_kv_line("Config", &format!("exists {}", path.display()));
    }
    Ok(())
}

fn connect(run: &RunConfig) -> Result<HttpService, String> {
    let service = HttpService::new(&run.client).map_err(|e| e.to_string())?;
    debug!(base_url = service.base_url().as_str(), "service configured");
    Ok(service)
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    match run.command.clone() {
        Command::Options => show_options(&connect(&run)?).await,
        Command::Generate(args) => generate(&run, connect(&run)?, args).await,
        Command::Query(args) => query(&run, &connect(&run)?, args).await,
        Command::Delete(args) => delete(&run, &connect(&run)?, args).await,
        Command::Update(args) => update(&run, &connect(&run)?, args).await,
        Command::Search(args) => search(&run, connect(&run)?, args).await,
        Command::Export(args) => export(&run, &connect(&run)?, args).await,
        Command::Import(args) => import(&connect(&run)?, args).await,
        // needs no service, so a bad base_url in the config cannot block it
        Command::Init => init_config(&run),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let (config_path, allow_missing) = match args.config.as_deref() {
        Some(p) => (Some(config::expand_tilde(p)), false),
        None => (config::default_config_path(), true),
    };
    let cfg = match config_path.as_ref() {
        Some(path) => config::load_config(path, allow_missing)?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg, config_path)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
