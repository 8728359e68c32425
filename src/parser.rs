use crate::COURSE_TABLE_ID;
use crate::extract::{labeled_numeric, labeled_token, labeled_value, strip_markup};
use crate::types::{DashboardRecord, ScheduleSlot};

use scraper::{ElementRef, Html, Selector};

/// Parses the attendance dashboard fragment captured for one user into
/// structured records, stamping `section_tag` into each.
///
/// A missing table or a table with only its header row is normal (the
/// portal renders an empty panel for semesters with no courses) and yields
/// an empty vec. Row order follows the source table.
pub fn parse_dashboard(html: &str, section_tag: &str) -> Vec<DashboardRecord> {
    let fragment = Html::parse_fragment(html);
    let table_selector =
        Selector::parse(&format!("table#{COURSE_TABLE_ID}")).expect("static selector");
    let row_selector = Selector::parse("tr").expect("static selector");

    let Some(table) = fragment.select(&table_selector).next() else {
        log::warn!("no course table found in dashboard fragment for {section_tag}");
        return Vec::new();
    };

    let records: Vec<DashboardRecord> = table
        .select(&row_selector)
        .skip(1) // header row
        .filter_map(|row| parse_row(row, section_tag))
        .collect();

    if records.is_empty() {
        log::warn!("course table for {section_tag} has no data rows");
    } else {
        log::info!("extracted {} dashboard rows for {section_tag}", records.len());
    }
    records
}

/// One table row to one record. Rows with fewer than five cells are
/// decorative or malformed and are skipped without complaint.
fn parse_row(row: ElementRef, section_tag: &str) -> Option<DashboardRecord> {
    let cell_selector = Selector::parse("td").expect("static selector");
    let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
    if cells.len() < 5 {
        return None;
    }

    let course_info = &cells[1];
    Some(DashboardRecord {
        serial: cells[0].clone(),
        section_tag: section_tag.to_string(),
        course_code: labeled_value(course_info, "Course Code")
            .map(|v| strip_markup(&v))
            .unwrap_or_default(),
        course_title: labeled_value(course_info, "Title").unwrap_or_default(),
        credit: labeled_numeric(course_info, "Credit").unwrap_or_default(),
        course_section: labeled_value(course_info, "Section").unwrap_or_default(),
        slot_one: parse_slot(&cells[2]),
        slot_two: parse_slot(&cells[3]),
    })
}

fn parse_slot(block: &str) -> ScheduleSlot {
    ScheduleSlot {
        day: labeled_value(block, "Day")
            .map(|v| strip_markup(&v))
            .unwrap_or_default(),
        time: labeled_value(block, "Time").unwrap_or_default(),
        room: labeled_value(block, "Room").unwrap_or_default(),
        teacher_initial: labeled_token(block, "Teacher").unwrap_or_default(),
    }
}

/// Text content of a cell with every text node trimmed and joined by
/// newlines, so `Label : value` pairs separated only by `<br>` or nested
/// tags land on their own lines.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
