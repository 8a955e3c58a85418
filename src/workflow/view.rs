use colored::Colorize;

use super::protocol::WorkflowState;
use crate::i18n::{self, Locale, Message};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Confirm,
    Cancel,
}

/// What the result panel shows for a workflow state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct View {
    pub label: Option<Message>,
    pub customer_id: Option<String>,
    pub actions: Vec<Action>,
    pub busy: Option<Message>,
}

pub fn project(state: &WorkflowState) -> View {
    match state {
        WorkflowState::Idle => View::default(),
        WorkflowState::Previewing { .. } => View {
            busy: Some(Message::RequestingPreview),
            ..View::default()
        },
        WorkflowState::Previewed { preview, .. } => View {
            label: Some(Message::PreviewLabel),
            customer_id: Some(preview.customer_id.clone()),
            actions: vec![Action::Confirm, Action::Cancel],
            busy: None,
        },
        WorkflowState::Confirming { preview, .. } => View {
            label: Some(Message::PreviewLabel),
            customer_id: Some(preview.customer_id.clone()),
            actions: Vec::new(),
            busy: Some(Message::Committing),
        },
        WorkflowState::Confirmed { confirmed, .. } => View {
            label: Some(Message::GeneratedLabel),
            customer_id: Some(confirmed.customer_id.clone()),
            actions: Vec::new(),
            busy: None,
        },
    }
}

pub fn render(view: &View, locale: Locale) -> String {
    let mut out = String::new();
    if let (Some(label), Some(id)) = (view.label, view.customer_id.as_deref()) {
        out.push_str(&format!(
            ":: {} : {}",
            i18n::text(locale, label).bold().white(),
            id.bold().cyan()
        ));
    }
    if !view.actions.is_empty() {
        let actions = view
            .actions
            .iter()
            .map(|a| {
                let text = match a {
                    Action::Confirm => i18n::text(locale, Message::ConfirmAction).green(),
                    Action::Cancel => i18n::text(locale, Message::CancelAction).yellow(),
                };
                format!("[{}]", text)
            })
            .collect::<Vec<_>>()
            .join(" ");
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("   {actions}"));
    }
    out
}
