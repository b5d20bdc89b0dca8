//! Transaction Page Rendering
//!
//! Injects the transaction history into `AllUtility.html`. The template is read
//! from disk on every request so it can be edited without a restart.

use crate::ledger::Transaction;
use std::path::{Path, PathBuf};

/// Replaced (first occurrence only) by the transaction list
pub const TRANSACTIONS_MARKER: &str = "<!-- Transaction data can go here -->";

pub const TEMPLATE_NAME: &str = "AllUtility.html";

#[derive(Debug, thiserror::Error)]
#[error("failed to read template {path:?}: {source}")]
pub struct RenderError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Minimal HTML text escaping
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// One `<p>` per record, oldest first
pub fn transaction_list_html(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .map(|t| format!("<p>{}</p>", escape_html(&t.record)))
        .collect()
}

pub fn inject_transactions(template: &str, transactions: &[Transaction]) -> String {
    template.replacen(TRANSACTIONS_MARKER, &transaction_list_html(transactions), 1)
}

#[derive(Debug, Clone)]
pub struct TransactionPage {
    template_path: PathBuf,
}

impl TransactionPage {
    pub fn new(templates_dir: &Path) -> Self {
        Self {
            template_path: templates_dir.join(TEMPLATE_NAME),
        }
    }

    pub async fn render(&self, transactions: &[Transaction]) -> Result<String, RenderError> {
        let template = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|source| RenderError {
                path: self.template_path.clone(),
                source,
            })?;

        Ok(inject_transactions(&template, transactions))
    }
}
