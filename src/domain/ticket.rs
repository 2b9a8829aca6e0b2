use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    InProgress,
    Done,
    Unknown,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Done => "Done",
            TicketStatus::Unknown => "Unknown",
        }
    }

    pub fn from_name(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "open" | "to do" | "todo" => TicketStatus::Open,
            "in progress" | "in-progress" => TicketStatus::InProgress,
            "done" | "closed" | "resolved" => TicketStatus::Done,
            _ => TicketStatus::Unknown,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: TicketStatus,
    pub issue_type: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub url: Option<String>,
}

impl Ticket {
    pub fn requirements(&self) -> Vec<String> {
        self.description
            .lines()
            .filter_map(|line| line.trim().strip_prefix("- "))
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Numbered lines (`1. item`) of the description, in sequence. Numbering
    /// must be contiguous from 1; an out-of-order line is ignored.
    pub fn acceptance_criteria(&self) -> Vec<String> {
        let mut criteria = Vec::new();
        for line in self.description.lines() {
            let expected = format!("{}. ", criteria.len() + 1);
            if let Some(item) = line.trim().strip_prefix(expected.as_str()) {
                criteria.push(item.trim().to_string());
            }
        }
        criteria
    }

    pub fn requirements_document(&self) -> String {
        let mut doc = format!("# Requirements Analysis for {}\n\n", self.key);
        doc.push_str(&format!("## Summary\n{}\n\n", self.summary));
        doc.push_str(&format!("## Description\n{}\n\n", self.description.trim()));
        doc.push_str(&format!("## Status\n{}\n\n", self.status));
        doc.push_str(&format!(
            "## Priority\n{}\n\n",
            self.priority.as_deref().unwrap_or("Unknown")
        ));

        doc.push_str("## Requirements\n");
        for requirement in self.requirements() {
            doc.push_str(&format!("- {requirement}\n"));
        }

        doc.push_str("\n## Acceptance Criteria\n");
        for (index, criterion) in self.acceptance_criteria().iter().enumerate() {
            doc.push_str(&format!("{}. {criterion}\n", index + 1));
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(description: &str) -> Ticket {
        Ticket {
            key: "ASCII-1".to_string(),
            summary: "Implement basic ASCII art conversion".to_string(),
            description: description.to_string(),
            status: TicketStatus::Open,
            issue_type: Some("Story".to_string()),
            priority: Some("High".to_string()),
            assignee: None,
            reporter: None,
            created: None,
            updated: None,
            url: None,
        }
    }

    #[test]
    fn extracts_requirements_and_criteria() {
        let ticket = ticket(
            "As a user...\n\nRequirements:\n- Support PNG\n- Allow resizing\n\nAcceptance Criteria:\n1. Upload works\n3. Skipped\n2. Resize works\n",
        );
        assert_eq!(ticket.requirements(), vec!["Support PNG", "Allow resizing"]);
        assert_eq!(
            ticket.acceptance_criteria(),
            vec!["Upload works", "Resize works"]
        );
    }

    #[test]
    fn renders_requirements_document() {
        let doc = ticket("- Support PNG\n1. Upload works").requirements_document();
        assert!(doc.starts_with("# Requirements Analysis for ASCII-1"));
        assert!(doc.contains("## Priority\nHigh"));
        assert!(doc.contains("- Support PNG\n"));
        assert!(doc.contains("1. Upload works\n"));
    }

    #[test]
    fn parses_status_names() {
        assert_eq!(TicketStatus::from_name("Open"), TicketStatus::Open);
        assert_eq!(TicketStatus::from_name("In Progress"), TicketStatus::InProgress);
        assert_eq!(TicketStatus::from_name("DONE"), TicketStatus::Done);
        assert_eq!(
            TicketStatus::from_name("Ready for Review"),
            TicketStatus::Unknown
        );
    }
}
