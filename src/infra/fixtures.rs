use async_trait::async_trait;

use crate::domain::files::FileSet;
use crate::domain::ticket::{Ticket, TicketStatus};
use crate::error::{AppError, AppResult};
use crate::services::{CodeGenerationService, IssueTrackerService, TestGenerationService};

struct FixtureTicket {
    key: &'static str,
    summary: &'static str,
    description: &'static str,
    status: TicketStatus,
    priority: &'static str,
    created: &'static str,
    updated: &'static str,
}

const FIXTURE_TICKETS: &[FixtureTicket] = &[
    FixtureTicket {
        key: "ASCII-1",
        summary: "Implement basic ASCII art conversion",
        description: "As a user, I want to convert images to ASCII art.

Requirements:
- Support PNG and JPEG formats
- Allow adjusting output size
- Support grayscale conversion

Acceptance Criteria:
1. User can upload an image
2. User can select output size
3. User can download ASCII art result
",
        status: TicketStatus::Open,
        priority: "High",
        created: "2024-05-07T10:00:00.000Z",
        updated: "2024-05-07T10:30:00.000Z",
    },
    FixtureTicket {
        key: "ASCII-2",
        summary: "Add color support to ASCII art",
        description: "As a user, I want to generate colored ASCII art.

Requirements:
- Support RGB color output
- Allow color intensity adjustment
- Maintain readability

Acceptance Criteria:
1. ASCII art preserves original colors
2. User can adjust color intensity
3. Output is readable on both light and dark backgrounds
",
        status: TicketStatus::Open,
        priority: "Medium",
        created: "2024-05-07T11:00:00.000Z",
        updated: "2024-05-07T11:15:00.000Z",
    },
    FixtureTicket {
        key: "ASCII-3",
        summary: "Add export options",
        description: "As a user, I want to export ASCII art in different formats.

Requirements:
- Support TXT format
- Support HTML format with styling
- Support PDF export

Acceptance Criteria:
1. User can export as plain text
2. User can export as styled HTML
3. User can export as PDF with preserved formatting
",
        status: TicketStatus::Open,
        priority: "Low",
        created: "2024-05-07T12:00:00.000Z",
        updated: "2024-05-07T12:10:00.000Z",
    },
];

impl FixtureTicket {
    fn to_ticket(&self) -> Ticket {
        Ticket {
            key: self.key.to_string(),
            summary: self.summary.to_string(),
            description: self.description.to_string(),
            status: self.status,
            issue_type: Some("Story".to_string()),
            priority: Some(self.priority.to_string()),
            assignee: Some("John Doe".to_string()),
            reporter: Some("Jane Smith".to_string()),
            created: Some(self.created.to_string()),
            updated: Some(self.updated.to_string()),
            url: None,
        }
    }
}

pub struct FixtureTracker;

#[async_trait]
impl IssueTrackerService for FixtureTracker {
    async fn list_open_tickets(&self) -> AppResult<Vec<Ticket>> {
        Ok(FIXTURE_TICKETS
            .iter()
            .filter(|ticket| ticket.status == TicketStatus::Open)
            .map(FixtureTicket::to_ticket)
            .collect())
    }

    async fn get_ticket_details(&self, ticket_id: &str) -> AppResult<Ticket> {
        let key = ticket_id.trim();
        FIXTURE_TICKETS
            .iter()
            .find(|ticket| ticket.key.eq_ignore_ascii_case(key))
            .map(FixtureTicket::to_ticket)
            .ok_or_else(|| AppError::TicketNotFound(key.to_string()))
    }
}

const CONVERTER_MODULE: &str = r#"import argparse
from PIL import Image

CHARSETS = {
    "simple": " .:-=+*#%@",
    "standard": " .`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$",
    "complex": "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ",
}


def image_to_ascii(image_path, width=100, charset="standard", output_file=None):
    """Convert an image to ASCII art."""
    img = Image.open(image_path).convert("L")
    height = max(1, int(width * img.height / img.width / 2))
    img = img.resize((width, height))
    chars = CHARSETS.get(charset, CHARSETS["standard"])

    lines = []
    for y in range(height):
        line = ""
        for x in range(width):
            pixel = img.getpixel((x, y))
            line += chars[int(pixel * (len(chars) - 1) / 255)]
        lines.append(line)
    result = "\n".join(lines)

    if output_file:
        with open(output_file, "w") as handle:
            handle.write(result)
    return result


def main():
    parser = argparse.ArgumentParser(description="Convert an image to ASCII art")
    parser.add_argument("image")
    parser.add_argument("-w", "--width", type=int, default=100)
    parser.add_argument("-c", "--charset", choices=sorted(CHARSETS), default="standard")
    parser.add_argument("-o", "--output")
    args = parser.parse_args()

    art = image_to_ascii(args.image, args.width, args.charset, args.output)
    if not args.output:
        print(art)


if __name__ == "__main__":
    main()
"#;

const PACKAGE_INIT: &str = r#"from .image_to_ascii import image_to_ascii

__all__ = ["image_to_ascii"]
"#;

const CONVERTER_TESTS: &str = r#"import os
import tempfile
import unittest

from PIL import Image

from ascii_art_converter.image_to_ascii import CHARSETS, image_to_ascii


class TestImageToAscii(unittest.TestCase):
    def setUp(self):
        self.image_path = os.path.join(tempfile.gettempdir(), "test_img.png")
        Image.new("RGB", (100, 100), color="white").save(self.image_path)

    def tearDown(self):
        if os.path.exists(self.image_path):
            os.remove(self.image_path)

    def test_width_is_respected(self):
        art = image_to_ascii(self.image_path, width=50)
        self.assertTrue(all(len(line) == 50 for line in art.split("\n")))

    def test_white_image_uses_lightest_character(self):
        art = image_to_ascii(self.image_path, width=10, charset="simple")
        self.assertEqual(set(art.replace("\n", "")), {CHARSETS["simple"][-1]})

    def test_output_file_is_written(self):
        output = os.path.join(tempfile.gettempdir(), "ascii_out.txt")
        art = image_to_ascii(self.image_path, width=20, output_file=output)
        with open(output) as handle:
            self.assertEqual(handle.read(), art)
        os.remove(output)


if __name__ == "__main__":
    unittest.main()
"#;

pub struct FixtureGenerator;

#[async_trait]
impl CodeGenerationService for FixtureGenerator {
    async fn generate_implementation(&self, _requirements: &str) -> AppResult<FileSet> {
        Ok([
            ("ascii_art_converter/__init__.py", PACKAGE_INIT),
            ("ascii_art_converter/image_to_ascii.py", CONVERTER_MODULE),
            ("ascii_art_converter/requirements.txt", "Pillow==9.5.0\n"),
        ]
        .into_iter()
        .collect())
    }
}

#[async_trait]
impl TestGenerationService for FixtureGenerator {
    async fn generate_tests(
        &self,
        implementation: &FileSet,
        _requirements: &str,
    ) -> AppResult<FileSet> {
        let mut tests = FileSet::new();
        if implementation
            .get("ascii_art_converter/image_to_ascii.py")
            .is_some()
        {
            tests.insert("tests/test_image_to_ascii.py", CONVERTER_TESTS);
        }
        tests.insert("tests/__init__.py", "");
        Ok(tests)
    }
}
