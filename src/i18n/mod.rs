//! Message tables for the console surface.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    ZhTw,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" | "en-gb" => Some(Locale::En),
            "zh" | "zh-tw" | "zh-hant" => Some(Locale::ZhTw),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    PreviewLabel,
    GeneratedLabel,
    RequestingPreview,
    Committing,
    ConfirmAction,
    CancelAction,
    DecisionPrompt,
    Cancelled,
    MissingCompanyName,
    MissingBranchName,
    CustomerIdRequired,
    CustomerIdNotFound,
    DeletePrompt,
    Aborted,
    NoSuggestions,
    ExportSaved,
    RetryHint,
}

pub fn text(locale: Locale, message: Message) -> &'static str {
    match locale {
        Locale::En => en(message),
        Locale::ZhTw => zh_tw(message),
    }
}

fn en(message: Message) -> &'static str {
    match message {
        Message::PreviewLabel => "Preview Customer ID",
        Message::GeneratedLabel => "Generated Customer ID",
        Message::RequestingPreview => "requesting preview",
        Message::Committing => "allocating customer ID",
        Message::ConfirmAction => "Confirm",
        Message::CancelAction => "Cancel",
        Message::DecisionPrompt => "[c]onfirm or [x] cancel",
        Message::Cancelled => "Preview discarded.",
        Message::MissingCompanyName => "Company name must not be empty.",
        Message::MissingBranchName => "Branch name must not be empty for this category.",
        Message::CustomerIdRequired => "Customer ID must not be empty.",
        Message::CustomerIdNotFound => "Customer ID not found",
        Message::DeletePrompt => "Are you sure you want to delete Customer ID",
        Message::Aborted => "Aborted.",
        Message::NoSuggestions => "no matches",
        Message::ExportSaved => "Export saved to",
        Message::RetryHint => "The preview is still pending; confirm again or cancel.",
    }
}

fn zh_tw(message: Message) -> &'static str {
    match message {
        Message::PreviewLabel => "預覽客戶編號",
        Message::GeneratedLabel => "已產生客戶編號",
        Message::RequestingPreview => "正在取得預覽",
        Message::Committing => "正在產生客戶編號",
        Message::ConfirmAction => "確認",
        Message::CancelAction => "取消",
        Message::DecisionPrompt => "[c] 確認 或 [x] 取消",
        Message::Cancelled => "已取消預覽。",
        Message::MissingCompanyName => "公司名稱不能為空。",
        Message::MissingBranchName => "此類別的分店名稱不能為空。",
        Message::CustomerIdRequired => "客戶編號不能為空。",
        Message::CustomerIdNotFound => "找不到客戶編號",
        Message::DeletePrompt => "確定要刪除客戶編號",
        Message::Aborted => "已中止。",
        Message::NoSuggestions => "沒有符合的項目",
        Message::ExportSaved => "匯出檔案已儲存至",
        Message::RetryHint => "預覽仍保留，可再次確認或取消。",
    }
}
