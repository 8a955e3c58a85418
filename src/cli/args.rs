use clap::{ArgAction, Args, Parser, Subcommand};

use crate::service::SuggestKind;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "custid",
    version,
    about = "customer-ID management client",
    long_about = "custid talks to the customer-ID service: it previews and allocates customer IDs, and queries, updates, deletes, imports and exports the customer table.\n\nExamples:\n  custid generate\n  custid generate -r 北投 -k 單一客戶 -n Acme --yes\n  custid query Acme --page 2\n  custid --url http://10.0.0.5:8000 export -o ids.xlsx\n\nTip: Use --config to persist the service URL and category labels."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        long = "lang",
        value_name = "LANG",
        global = true,
        help_heading = "Output",
        help = "Message language (en, zh-TW)."
    )]
    pub lang: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.custid/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Base URL of the customer-ID service."
    )]
    pub url: Option<String>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL."
    )]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the regions, categories and extra region codes offered by the service.
    Options,
    /// Preview a customer ID and allocate it on confirmation.
    Generate(GenerateArgs),
    /// Show the customer IDs recorded for a company.
    Query(QueryArgs),
    /// Delete a customer ID.
    Delete(DeleteArgs),
    /// Change the company or branch name stored for a customer ID.
    Update(UpdateArgs),
    /// Look up completions for a company name, branch name or customer ID.
    Search(SearchArgs),
    /// Download the customer table as a spreadsheet.
    Export(ExportArgs),
    /// Upload a spreadsheet and merge it into the customer table.
    Import(ImportArgs),
    /// Write a commented default config file if none exists.
    Init,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    #[arg(short = 'r', long = "region", value_name = "REGION", help = "Region (prompted when omitted).")]
    pub region: Option<String>,

    #[arg(short = 'k', long = "category", value_name = "CATEGORY", help = "Category (prompted when omitted).")]
    pub category: Option<String>,

    #[arg(short = 'n', long = "company", value_name = "NAME", help = "Company name.")]
    pub company_name: Option<String>,

    #[arg(
        short = 'e',
        long = "extra-region-code",
        value_name = "CODE",
        help = "Extra region code (chain and related-enterprise categories)."
    )]
    pub extra_region_code: Option<String>,

    #[arg(
        short = 'b',
        long = "branch-handling",
        value_name = "MODE",
        help = "Branch handling for consolidated invoices: issue-own-invoice-number or assign-sequential-branch-number."
    )]
    pub branch_handling: Option<String>,

    #[arg(short = 'B', long = "branch", value_name = "NAME", help = "Branch name.")]
    pub branch_name: Option<String>,

    #[arg(
        short = 'y',
        long = "yes",
        conflicts_with = "preview_only",
        help = "Allocate the previewed ID without asking."
    )]
    pub yes: bool,

    #[arg(long = "preview-only", help = "Show the preview and discard it.")]
    pub preview_only: bool,

    #[arg(long = "no-input", help = "Never prompt; missing values are left empty.")]
    pub no_input: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(value_name = "COMPANY", help = "Company name to look up.")]
    pub company_name: String,

    #[arg(short = 'p', long = "page", value_name = "N", default_value_t = 1, help = "Page to show (1-based).")]
    pub page: usize,

    #[arg(long = "page-size", value_name = "N", help = "Rows per page.")]
    pub page_size: Option<usize>,

    #[arg(long = "all", help = "Print every page.")]
    pub all: bool,

    #[arg(short = 'f', long = "format", value_name = "FORMAT", help = "Output format (text, json).")]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(value_name = "CUSTOMER_ID")]
    pub customer_id: String,

    #[arg(short = 'y', long = "yes", help = "Delete without asking.")]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    #[arg(value_name = "CUSTOMER_ID")]
    pub customer_id: String,

    #[arg(long = "company", value_name = "NAME", help = "New company name.")]
    pub company_name: Option<String>,

    #[arg(long = "branch", value_name = "NAME", help = "New branch name.")]
    pub branch_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_enum, value_name = "KIND")]
    pub kind: SuggestKind,

    #[arg(value_name = "KEYWORD")]
    pub keyword: String,

    #[arg(long = "region", value_name = "REGION")]
    pub region: Option<String>,

    #[arg(long = "category", value_name = "CATEGORY")]
    pub category: Option<String>,

    #[arg(long = "company", value_name = "NAME")]
    pub company_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        default_value = "customer_ids.xlsx",
        help = "Where to write the spreadsheet."
    )]
    pub output: String,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(value_name = "FILE", help = "Spreadsheet to upload.")]
    pub file: String,
}
