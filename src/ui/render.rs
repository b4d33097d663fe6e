//! Styled terminal output: status lines and tables.

use bytesize::ByteSize;
use dialoguer::console::style;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::session::controller::SessionSummary;
use crate::session::runtime::ImageRecord;
use crate::session::transfer::TransferOutcome;

pub fn print_header(text: &str) {
    println!();
    println!("{}", style(text).bold().cyan());
    println!("{}", style("─".repeat(text.chars().count())).dim());
}

pub fn print_info(text: &str) {
    println!("{} {}", style("·").dim(), text);
}

pub fn print_success(text: &str) {
    println!("{} {}", style("✓").green(), text);
}

pub fn print_warn(text: &str) {
    println!("{} {}", style("!").yellow().bold(), text);
}

pub fn print_error(text: &str) {
    eprintln!("{} {}", style("✗").red().bold(), text);
}

#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "REPOSITORY:TAG")]
    reference: String,
    #[tabled(rename = "IMAGE ID")]
    id: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "SIZE")]
    size: String,
}

/// Render locally stored images, one row per `repository:tag` name.
pub fn image_table(records: &[ImageRecord]) -> String {
    let mut rows = Vec::new();
    for record in records {
        let id = short_id(&record.id);
        let created = format_created(record.created);
        let size = ByteSize(record.size.max(0) as u64).to_string();
        let names = if record.repo_tags.is_empty() {
            vec!["<none>:<none>".to_string()]
        } else {
            record.repo_tags.clone()
        };
        for reference in names {
            rows.push(ImageRow {
                reference,
                id: id.clone(),
                created: created.clone(),
                size: size.clone(),
            });
        }
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "FILE")]
    file: String,
    #[tabled(rename = "RESULT")]
    result: String,
    #[tabled(rename = "DESTINATION")]
    destination: String,
}

/// Render the per-file results of one transfer round.
pub fn outcome_table(outcomes: &[TransferOutcome]) -> String {
    let rows = outcomes.iter().map(|outcome| OutcomeRow {
        file: outcome.file.clone(),
        result: if outcome.succeeded {
            "ok".to_string()
        } else {
            "FAILED".to_string()
        },
        destination: outcome.destination.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print the end-of-session summary block.
pub fn print_summary(summary: &SessionSummary) {
    print_header("Session summary");

    match &summary.source_image {
        Some(image) => print_info(&format!("source image: {image}")),
        None => print_info("source image: (none resolved)"),
    }
    if let Some(id) = &summary.container_id {
        print_info(&format!("container: {}", short_id(id)));
    }
    print_info(&format!(
        "files copied in: {}, out: {}",
        summary.files_in, summary.files_out
    ));
    match &summary.committed_image {
        Some(reference) => print_success(&format!("committed image: {reference}")),
        None => print_info("committed image: (none)"),
    }
    if summary.container_removed {
        print_success("container removed");
    } else if let Some(id) = &summary.container_id {
        print_warn(&format!(
            "container {} was left behind; remove it with: docker rm -f {}",
            short_id(id),
            short_id(id)
        ));
    }
}

fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(12).collect()
}

fn format_created(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reference: &str) -> ImageRecord {
        ImageRecord {
            id: "sha256:0123456789abcdef0123".to_string(),
            repo_tags: vec![reference.to_string()],
            size: 7_800_000,
            created: 0,
        }
    }

    #[test]
    fn image_table_shows_one_row_per_name() {
        let table = image_table(&[record("alpine:latest"), record("acme/tool:v2")]);

        assert!(table.contains("REPOSITORY:TAG"));
        assert!(table.contains("alpine:latest"));
        assert!(table.contains("acme/tool:v2"));
        assert!(table.contains("0123456789ab"));
    }

    #[test]
    fn untagged_images_still_get_a_row() {
        let mut untagged = record("ignored");
        untagged.repo_tags.clear();

        let table = image_table(&[untagged]);

        assert!(table.contains("<none>:<none>"));
    }

    #[test]
    fn outcome_table_flags_failures() {
        let outcomes = vec![
            TransferOutcome {
                file: "hosts".to_string(),
                succeeded: true,
                destination: "/tmp/out/hosts".to_string(),
            },
            TransferOutcome {
                file: "shadow".to_string(),
                succeeded: false,
                destination: "/tmp/out/shadow".to_string(),
            },
        ];

        let table = outcome_table(&outcomes);

        assert!(table.contains("ok"));
        assert!(table.contains("FAILED"));
        assert!(table.contains("/tmp/out/hosts"));
    }

    #[test]
    fn created_formats_as_a_date() {
        assert_eq!(format_created(0), "1970-01-01 00:00");
        assert_eq!(format_created(i64::MIN), "-");
    }
}
