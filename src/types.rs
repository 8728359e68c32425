use serde::{Deserialize, Serialize};

/// One weekly meeting pattern of a course. All fields come straight out of
/// the dashboard cell text and may be empty when the portal omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub day: String,
    pub time: String,
    pub room: String,
    pub teacher_initial: String,
}

impl ScheduleSlot {
    /// True when the day value carries real data. A schedule cell with no
    /// "Day :" value bleeds the next line's raw `Time :` label into the
    /// extracted day, which must not count as a day.
    pub fn day_is_real(&self) -> bool {
        !self.day.is_empty() && !self.day.to_lowercase().starts_with("time :")
    }

    /// Same leftover-label check for the time value, which picks up a raw
    /// `Room :` label when the time is missing.
    pub fn time_is_real(&self) -> bool {
        !self.time.is_empty() && !self.time.to_lowercase().starts_with("room :")
    }

    /// Loose validity used for a course's first slot: anything real at all.
    pub fn has_any_data(&self) -> bool {
        self.day_is_real() || self.time_is_real() || !self.teacher_initial.is_empty()
    }

    /// Strict validity used for the second slot: a secondary meeting with
    /// only a day but no time is not a meeting.
    pub fn is_complete(&self) -> bool {
        !self.teacher_initial.is_empty() && self.day_is_real() && self.time_is_real()
    }
}

/// One row of a user's attendance dashboard, tagged with the section label
/// of the user whose session produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub serial: String,
    pub section_tag: String,
    pub course_code: String,
    pub course_title: String,
    pub credit: String,
    pub course_section: String,
    pub slot_one: ScheduleSlot,
    pub slot_two: ScheduleSlot,
}

/// Contact details for one teacher, keyed externally by initial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherDetail {
    #[serde(rename = "FullName")]
    pub full_name: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
}

/// One merged class slot in the final combined routine. Field order is the
/// CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineEntry {
    #[serde(rename = "CourseCode")]
    pub course_code: String,
    #[serde(rename = "CourseTitle")]
    pub course_title: String,
    #[serde(rename = "Teacher")]
    pub teacher: String,
    #[serde(rename = "TeacherPhone")]
    pub teacher_phone: String,
    #[serde(rename = "TeacherEmail")]
    pub teacher_email: String,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Room")]
    pub room: String,
    #[serde(rename = "TimeSlot")]
    pub time_slot: String,
    #[serde(rename = "Section")]
    pub section: String,
}

impl RoutineEntry {
    /// What makes a class slot unique across all users' dashboards.
    pub fn dedup_key(&self) -> (String, String, String, String, String) {
        (
            self.course_code.clone(),
            self.day.clone(),
            self.time_slot.clone(),
            self.section.clone(),
            self.teacher.clone(),
        )
    }
}
