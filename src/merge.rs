use crate::types::{DashboardRecord, RoutineEntry, ScheduleSlot, TeacherDetail};

use std::collections::{HashMap, HashSet};

/// Combines every user's dashboard records into the final routine.
///
/// Inclusion is per record: everything from the primary user's session is
/// eligible, and the secondary user contributes only lab courses (title
/// contains "lab", case-insensitive). Records from any other session tag
/// are dropped. The first slot of an included record is emitted when it
/// has any real data; the second slot only when teacher, day and time are
/// all present — a secondary meeting with a day but no time is noise.
///
/// Entries are deduplicated on (course code, day, time, section, teacher),
/// first occurrence wins, input order preserved. Pure function: the same
/// input always yields the same output.
pub fn combine_routine(
    records: &[DashboardRecord],
    teachers: &HashMap<String, TeacherDetail>,
    primary_tag: &str,
    secondary_tag: Option<&str>,
) -> Vec<RoutineEntry> {
    let mut combined = Vec::new();

    for record in records {
        let is_lab = record.course_title.to_lowercase().contains("lab");
        let included = record.section_tag == primary_tag
            || (secondary_tag.is_some_and(|tag| record.section_tag == tag) && is_lab);
        if !included {
            log::debug!(
                "excluding {} from session {} (not primary, not a lab)",
                record.course_code,
                record.section_tag
            );
            continue;
        }

        if record.slot_one.has_any_data() {
            combined.push(build_entry(record, &record.slot_one, teachers));
        }
        if record.slot_two.is_complete() {
            combined.push(build_entry(record, &record.slot_two, teachers));
        }
    }

    dedup(combined)
}

fn build_entry(
    record: &DashboardRecord,
    slot: &ScheduleSlot,
    teachers: &HashMap<String, TeacherDetail>,
) -> RoutineEntry {
    let initial = slot.teacher_initial.as_str();
    let detail = teachers.get(initial);

    let teacher = match detail {
        Some(d) if !d.full_name.is_empty() => d.full_name.clone(),
        _ if initial.is_empty() => "N/A".to_string(),
        _ => initial.to_string(),
    };

    RoutineEntry {
        course_code: record.course_code.clone(),
        course_title: record.course_title.clone(),
        teacher,
        teacher_phone: detail.map(|d| d.phone.clone()).unwrap_or_default(),
        teacher_email: detail.map(|d| d.email.clone()).unwrap_or_default(),
        day: slot.day.clone(),
        room: slot.room.clone(),
        time_slot: slot.time.clone(),
        section: record.course_section.clone(),
    }
}

fn dedup(entries: Vec<RoutineEntry>) -> Vec<RoutineEntry> {
    let mut seen = HashSet::new();
    let before = entries.len();
    let unique: Vec<RoutineEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.dedup_key()))
        .collect();
    if unique.len() < before {
        log::info!("dropped {} duplicate routine entries", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dashboard;

    fn slot(day: &str, time: &str, room: &str, teacher: &str) -> ScheduleSlot {
        ScheduleSlot {
            day: day.to_string(),
            time: time.to_string(),
            room: room.to_string(),
            teacher_initial: teacher.to_string(),
        }
    }

    fn record(tag: &str, code: &str, title: &str, one: ScheduleSlot, two: ScheduleSlot) -> DashboardRecord {
        DashboardRecord {
            serial: "1".to_string(),
            section_tag: tag.to_string(),
            course_code: code.to_string(),
            course_title: title.to_string(),
            credit: "3".to_string(),
            course_section: "B".to_string(),
            slot_one: one,
            slot_two: two,
        }
    }

    fn lookup(entries: &[(&str, &str, &str, &str)]) -> HashMap<String, TeacherDetail> {
        entries
            .iter()
            .map(|(initial, name, phone, email)| {
                (
                    initial.to_string(),
                    TeacherDetail {
                        full_name: name.to_string(),
                        phone: phone.to_string(),
                        email: email.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn secondary_non_lab_course_is_excluded() {
        let records = vec![
            record(
                "101",
                "CSE 207",
                "Algorithms Lab",
                slot("Sunday", "9:00-10:30", "303", "XYZ"),
                ScheduleSlot::default(),
            ),
            record(
                "102",
                "MAT 101",
                "Calculus",
                slot("Monday", "11:00-12:30", "110", "ABC"),
                ScheduleSlot::default(),
            ),
        ];

        let routine = combine_routine(&records, &HashMap::new(), "101", Some("102"));
        assert_eq!(routine.len(), 1);
        assert_eq!(routine[0].course_code, "CSE 207");
    }

    #[test]
    fn secondary_lab_course_is_included() {
        let records = vec![record(
            "102",
            "CSE 208",
            "Database Lab",
            slot("Wednesday", "2:00-3:30", "402", "DEF"),
            ScheduleSlot::default(),
        )];

        let routine = combine_routine(&records, &HashMap::new(), "101", Some("102"));
        assert_eq!(routine.len(), 1);
        assert_eq!(routine[0].course_title, "Database Lab");
    }

    #[test]
    fn unknown_session_tag_is_excluded_even_for_labs() {
        let records = vec![record(
            "103",
            "CSE 208",
            "Database Lab",
            slot("Wednesday", "2:00-3:30", "402", "DEF"),
            ScheduleSlot::default(),
        )];

        assert!(combine_routine(&records, &HashMap::new(), "101", Some("102")).is_empty());
        assert!(combine_routine(&records, &HashMap::new(), "101", None).is_empty());
    }

    #[test]
    fn empty_first_slot_emits_nothing() {
        let records = vec![record(
            "101",
            "CSE 400",
            "Thesis",
            ScheduleSlot::default(),
            ScheduleSlot::default(),
        )];
        assert!(combine_routine(&records, &HashMap::new(), "101", None).is_empty());
    }

    #[test]
    fn leftover_label_artifacts_do_not_count_as_data() {
        let records = vec![record(
            "101",
            "CSE 299",
            "Project",
            slot("Time : 2:00-3:30", "Room : 505", "", ""),
            ScheduleSlot::default(),
        )];
        assert!(combine_routine(&records, &HashMap::new(), "101", None).is_empty());
    }

    #[test]
    fn incomplete_second_slot_is_dropped_while_first_is_kept() {
        // Day but no time: meaningful for slot one, not for slot two.
        let records = vec![record(
            "101",
            "CSE 207",
            "Data Structures",
            slot("Sunday", "9:00-10:30", "303", "XYZ"),
            slot("Tuesday", "", "303", "XYZ"),
        )];

        let routine = combine_routine(&records, &HashMap::new(), "101", None);
        assert_eq!(routine.len(), 1);
        assert_eq!(routine[0].day, "Sunday");
    }

    #[test]
    fn complete_second_slot_is_emitted() {
        let records = vec![record(
            "101",
            "CSE 207",
            "Data Structures",
            slot("Sunday", "9:00-10:30", "303", "XYZ"),
            slot("Tuesday", "9:00-10:30", "303", "XYZ"),
        )];

        let routine = combine_routine(&records, &HashMap::new(), "101", None);
        assert_eq!(routine.len(), 2);
        assert_eq!(routine[0].day, "Sunday");
        assert_eq!(routine[1].day, "Tuesday");
    }

    #[test]
    fn teacher_lookup_enriches_and_falls_back() {
        let teachers = lookup(&[("XYZ", "X. Y. Zaman", "017000", "xyz@uni.edu")]);
        let records = vec![
            record(
                "101",
                "CSE 207",
                "Data Structures",
                slot("Sunday", "9:00-10:30", "303", "XYZ"),
                ScheduleSlot::default(),
            ),
            record(
                "101",
                "MAT 101",
                "Calculus",
                slot("Monday", "11:00-12:30", "110", "ABC"),
                ScheduleSlot::default(),
            ),
        ];

        let routine = combine_routine(&records, &teachers, "101", None);
        assert_eq!(routine[0].teacher, "X. Y. Zaman");
        assert_eq!(routine[0].teacher_phone, "017000");
        assert_eq!(routine[0].teacher_email, "xyz@uni.edu");
        // Unmapped initial stands in for the full name.
        assert_eq!(routine[1].teacher, "ABC");
        assert_eq!(routine[1].teacher_phone, "");
    }

    #[test]
    fn missing_initial_with_day_falls_back_to_na() {
        let records = vec![record(
            "101",
            "PHY 109",
            "Physics",
            slot("Thursday", "9:00-10:30", "201", ""),
            ScheduleSlot::default(),
        )];
        let routine = combine_routine(&records, &HashMap::new(), "101", None);
        assert_eq!(routine[0].teacher, "N/A");
    }

    #[test]
    fn duplicate_slots_collapse_to_first_occurrence() {
        let teachers = lookup(&[("XYZ", "X. Y. Zaman", "017000", "xyz@uni.edu")]);
        let mut second = record(
            "102",
            "CSE 207",
            "Data Structures Lab",
            slot("Sunday", "9:00-10:30", "999", "XYZ"),
            ScheduleSlot::default(),
        );
        second.serial = "7".to_string();
        let records = vec![
            record(
                "101",
                "CSE 207",
                "Data Structures Lab",
                slot("Sunday", "9:00-10:30", "303", "XYZ"),
                ScheduleSlot::default(),
            ),
            second,
        ];

        let routine = combine_routine(&records, &teachers, "101", Some("102"));
        assert_eq!(routine.len(), 1);
        // First occurrence wins, including non-key fields.
        assert_eq!(routine[0].room, "303");
    }

    #[test]
    fn merging_twice_is_identical() {
        let teachers = lookup(&[("XYZ", "X. Y. Zaman", "", "")]);
        let records = vec![
            record(
                "101",
                "CSE 207",
                "Data Structures",
                slot("Sunday", "9:00-10:30", "303", "XYZ"),
                slot("Tuesday", "9:00-10:30", "303", "XYZ"),
            ),
            record(
                "102",
                "CSE 208",
                "Database Lab",
                slot("Wednesday", "2:00-3:30", "402", "DEF"),
                ScheduleSlot::default(),
            ),
        ];

        let first = combine_routine(&records, &teachers, "101", Some("102"));
        let second = combine_routine(&records, &teachers, "101", Some("102"));
        assert_eq!(first, second);
    }

    #[test]
    fn parses_and_merges_end_to_end() {
        let html = "<div id=\"ctl00_MainContainer_UpdatePanel02\">\
            <table id=\"ctl00_MainContainer_gvCourseList\">\
            <tr><th>SL</th><th>Course</th><th>S1</th><th>S2</th><th>Att</th></tr>\
            <tr><td>1</td>\
            <td>Course Code : CSE 207<br>Title : Data Structures Lab<br>Credit : 1.5<br>Section : B</td>\
            <td>Day : Sunday<br>Time : 09:00 AM - 10:30 AM<br>Room : 303<br>Teacher : XYZ</td>\
            <td></td><td>85%</td></tr>\
            </table></div>";

        let records = parse_dashboard(html, "B-61");
        let teachers = lookup(&[("XYZ", "X. Y. Zaman", "017000", "xyz@uni.edu")]);
        let routine = combine_routine(&records, &teachers, "B-61", None);

        assert_eq!(routine.len(), 1);
        let entry = &routine[0];
        assert_eq!(entry.course_code, "CSE 207");
        assert_eq!(entry.teacher, "X. Y. Zaman");
        assert_eq!(entry.day, "Sunday");
        assert_eq!(entry.time_slot, "09:00 AM - 10:30 AM");
        assert_eq!(entry.section, "B");
    }
}
