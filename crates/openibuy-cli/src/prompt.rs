//! Interactive terminal prompting
//!
//! The human-in-the-loop half of settlement: the saga surfaces a pending
//! transaction request in its logs, the operator signs it in their wallet
//! and pastes the resulting hash here. Declining ("skip" or EOF) is
//! always allowed and leaves a soft gap, never an error.

use std::collections::HashMap;
use std::io::IsTerminal;

use async_trait::async_trait;
use colored::Colorize;

use openibuy_client::{is_bootstrap_token, TransactionEvidenceSource};
use openibuy_types::{EscrowAction, TxHash};

async fn read_line(question: String) -> Option<String> {
    let answer = tokio::task::spawn_blocking(move || {
        use std::io::Write;

        print!("{question}");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    })
    .await
    .ok()
    .flatten()?;
    Some(answer)
}

/// Ask the operator to paste the emailed bootstrap token.
pub async fn ask_bootstrap_token() -> Option<String> {
    if !std::io::stdin().is_terminal() {
        return None;
    }
    loop {
        let answer = read_line(format!(
            "{} Paste bootstrap token from email (mbt_...), or type \"skip\": ",
            "[auth]".bright_cyan()
        ))
        .await?;
        if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
            return None;
        }
        if is_bootstrap_token(&answer) {
            return Some(answer);
        }
        println!("{} Invalid bootstrap token format, please retry.", "[auth]".yellow());
    }
}

/// Evidence source combining pre-supplied hashes with a TTY prompt.
///
/// Pre-supplied hashes are already validated (parsing them is part of
/// configuration); the prompt loops until it gets a valid hash or an
/// explicit skip. Without a TTY it degrades to the pre-supplied map.
pub struct PromptEvidence {
    provided: HashMap<EscrowAction, TxHash>,
    interactive: bool,
}

impl PromptEvidence {
    pub fn new(provided: HashMap<EscrowAction, TxHash>, interactive: bool) -> Self {
        Self {
            provided,
            interactive,
        }
    }
}

#[async_trait]
impl TransactionEvidenceSource for PromptEvidence {
    async fn request_hash(&self, action: EscrowAction) -> Option<TxHash> {
        if let Some(hash) = self.provided.get(&action) {
            return Some(hash.clone());
        }
        if !self.interactive {
            return None;
        }
        if !std::io::stdin().is_terminal() {
            println!(
                "{} interactive mode requires a TTY; skipping tx hash prompt.",
                format!("[{action}]").yellow()
            );
            return None;
        }
        loop {
            let answer = read_line(format!(
                "{} Paste tx hash (0x...64) then Enter, or type \"skip\": ",
                format!("[{action}]").bright_cyan()
            ))
            .await?;
            if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
                return None;
            }
            match TxHash::parse(&answer) {
                Ok(hash) => return Some(hash),
                Err(_) => println!(
                    "{} Invalid tx hash format, please retry.",
                    format!("[{action}]").yellow()
                ),
            }
        }
    }
}
