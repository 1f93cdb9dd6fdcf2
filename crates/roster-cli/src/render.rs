//! Human and JSON rendering of directory data

use colored::*;
use roster_core::{CollectionPage, EmployeeRecord, EmploymentStatus, Freshness, UserIdentity};
use serde_json::{Value, json};

fn status_label(status: EmploymentStatus) -> ColoredString {
    match status {
        EmploymentStatus::Active => status.as_str().green(),
        EmploymentStatus::Flagged => status.as_str().yellow().bold(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// One line per record plus a paging footer
pub fn page_table(page: &CollectionPage) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<22} {:<28} {:>4} {:<6} {:>7}  {}\n",
        "ID", "NAME", "EMAIL", "AGE", "CLASS", "ATTEND", "STATUS"
    ));
    for record in page.records() {
        out.push_str(&format!(
            "{:<6} {:<22} {:<28} {:>4} {:<6} {:>6.1}%  {}\n",
            truncate(record.id.as_str(), 6),
            truncate(&record.name, 22),
            truncate(&record.email, 28),
            record.age,
            truncate(&record.class, 6),
            record.attendance,
            status_label(record.status)
        ));
    }

    out.push_str(&format!(
        "\n{} of {} employees",
        page.len(),
        page.total_count
    ));
    if let Some(cursor) = page
        .page_info
        .has_next_page
        .then_some(page.page_info.end_cursor.as_deref())
        .flatten()
    {
        out.push_str(&format!("  (next page: --after {})", cursor));
    }
    if page.freshness != Freshness::Fresh {
        out.push_str(&format!("  [{}]", page.freshness.to_string().dimmed()));
    }
    out
}

pub fn record_detail(record: &EmployeeRecord) -> String {
    let subjects = if record.subjects.is_empty() {
        "-".to_string()
    } else {
        record.subjects.join(", ")
    };
    [
        format!("{}", record.name.bold()),
        format!("  {:<11} {}", "ID", record.id),
        format!("  {:<11} {}", "Email", record.email),
        format!("  {:<11} {}", "Phone", record.phone),
        format!("  {:<11} {}", "Age", record.age),
        format!("  {:<11} {}", "Class", record.class),
        format!("  {:<11} {}", "Subjects", subjects),
        format!("  {:<11} {:.1}%", "Attendance", record.attendance),
        format!("  {:<11} {}", "Status", status_label(record.status)),
    ]
    .join("\n")
}

pub fn identity_line(identity: &UserIdentity) -> String {
    format!("{} ({})", identity.email.bold(), identity.role)
}

pub fn page_json(page: &CollectionPage) -> Value {
    json!({
        "records": page.records(),
        "pageInfo": page.page_info,
        "totalCount": page.total_count,
        "freshness": page.freshness.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::{EmployeeId, PageInfo, QuerySpec};

    fn record(id: &str, name: &str) -> EmployeeRecord {
        EmployeeRecord {
            id: EmployeeId::from(id),
            user_id: format!("u{}", id),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            phone: "555".to_string(),
            age: 30,
            class: "A".to_string(),
            subjects: vec!["Math".to_string(), "Art".to_string()],
            attendance: 92.5,
            status: EmploymentStatus::Flagged,
        }
    }

    fn page(records: Vec<EmployeeRecord>, next: bool) -> CollectionPage {
        let mut page = CollectionPage::empty(QuerySpec::default());
        page.total_count = 10;
        page.page_info = PageInfo {
            has_next_page: next,
            end_cursor: Some("cursor:2".to_string()),
            ..PageInfo::default()
        };
        page.records = records;
        page.freshness = Freshness::Fresh;
        page
    }

    #[test]
    fn test_table_lists_rows_and_cursor() {
        colored::control::set_override(false);
        let table = page_table(&page(vec![record("1", "Ada"), record("2", "Grace")], true));
        assert!(table.contains("Ada"));
        assert!(table.contains("Grace"));
        assert!(table.contains("2 of 10 employees"));
        assert!(table.contains("--after cursor:2"));
    }

    #[test]
    fn test_detail_joins_subjects() {
        colored::control::set_override(false);
        let detail = record_detail(&record("7", "Jo"));
        assert!(detail.contains("Math, Art"));
        assert!(detail.contains("92.5%"));
        assert!(detail.contains("flagged"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("A very long name", 6), "A ver…");
    }

    #[test]
    fn test_page_json_shape() {
        let value = page_json(&page(vec![record("1", "Ada")], false));
        assert_eq!(value["totalCount"], 10);
        assert_eq!(value["records"][0]["name"], "Ada");
        assert_eq!(value["freshness"], "fresh");
    }
}
