use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH_SLUG: &str = "ascii-art-converter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn for_ticket(ticket_id: &str, summary: &str) -> Self {
        let ticket = ticket_id.trim().to_lowercase();
        Self(format!("feature/{}-{}", ticket, slugify(summary)))
    }

    pub fn ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchState {
    Created,
    AlreadyExisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsuredBranch {
    pub name: BranchName,
    pub base_branch: String,
    pub state: BranchState,
}

impl EnsuredBranch {
    pub fn created(&self) -> bool {
        self.state == BranchState::Created
    }
}

fn slugify(input: &str) -> String {
    let clean = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();

    let trimmed = clean.trim_matches('-');
    let mut result = String::with_capacity(trimmed.len());
    let mut prev_dash = false;
    for ch in trimmed.chars() {
        if ch == '-' {
            if !prev_dash {
                result.push(ch);
            }
            prev_dash = true;
        } else {
            result.push(ch);
            prev_dash = false;
        }
    }
    if result.is_empty() {
        "changes".to_string()
    } else {
        result
    }
}
