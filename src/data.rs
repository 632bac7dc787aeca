use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Type aliases for clarity
pub type Day = String;
pub type TimeLabel = String;
pub type RoomId = String;
pub type Department = String;

/// Teaching days, in the order the search walks them.
pub const DAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// The six daily periods. There is no period between 1:00 and 2:00.
pub const TIME_SLOTS: [&str; 6] = [
    "9:00-10:00",
    "10:00-11:00",
    "11:00-12:00",
    "12:00-1:00",
    "2:00-3:00",
    "3:00-4:00",
];

/// Room pool used when the caller does not supply one.
pub const DEFAULT_ROOMS: [&str; 9] = [
    "CS-101", "CS-102", "CS-103", "CS-104", "CS-105", "M-201", "M-202", "P-301", "P-302",
];

/// A faculty member who can be assigned to generated slots.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subjects: Vec<String>,
    /// Day name -> time labels the teacher can take.
    pub availability: BTreeMap<Day, Vec<TimeLabel>>,
    /// Only enforced when `GeneratorOptions::enforce_max_hours` is set.
    pub max_hours_per_week: u32,
}

impl Teacher {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    pub fn is_available(&self, day: &str, time: &str) -> bool {
        self.availability
            .get(day)
            .is_some_and(|times| times.iter().any(|t| t == time))
    }
}

/// An immovable class placement supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedSlot {
    pub department: Department,
    pub subject: String,
    #[serde(rename = "faculty", alias = "teacher")]
    pub teacher: String,
    pub day: Day,
    pub time: TimeLabel,
    pub room: RoomId,
    pub batch: String,
}

/// Weekly hours a subject needs for each of its batches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRequirement {
    pub subject: String,
    pub department: Department,
    pub hours_per_week: u32,
    pub batches: Vec<String>,
    #[serde(default = "default_required_teachers")]
    pub required_teachers: u32,
}

fn default_required_teachers() -> u32 {
    1
}

/// A student cohort as listed in the optional class upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    pub department: Department,
    #[serde(default)]
    pub strength: u32,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// The complete input for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableInput {
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub fixed_slots: Vec<FixedSlot>,
    #[serde(default, alias = "subjectMappings")]
    pub subject_requirements: Vec<SubjectRequirement>,
    #[serde(default)]
    pub classes: Vec<ClassGroup>,
    /// Explicit room pool; `DEFAULT_ROOMS` is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<Vec<RoomId>>,
}

/// A class sitting in one cell of the timetable grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSlot {
    pub subject: String,
    pub teacher: String,
    pub room: RoomId,
    pub batch: String,
    pub is_fixed: bool,
}

impl From<&FixedSlot> for PlacedSlot {
    fn from(slot: &FixedSlot) -> Self {
        PlacedSlot {
            subject: slot.subject.clone(),
            teacher: slot.teacher.clone(),
            room: slot.room.clone(),
            batch: slot.batch.clone(),
            is_fixed: true,
        }
    }
}

impl fmt::Display for PlacedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}) [{}]",
            self.subject, self.teacher, self.room, self.batch
        )?;
        if self.is_fixed {
            write!(f, " [FIXED]")?;
        }
        Ok(())
    }
}

/// department -> day -> time -> slot. At most one slot per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Timetable(BTreeMap<Department, BTreeMap<Day, BTreeMap<TimeLabel, PlacedSlot>>>);

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty day map for every teaching day of `department`.
    pub fn add_department(&mut self, department: &str) {
        let days = self.0.entry(department.to_string()).or_default();
        for day in DAYS {
            days.entry(day.to_string()).or_default();
        }
    }

    /// Stores `slot` in its cell, returning whatever was there before.
    pub fn place(
        &mut self,
        department: &str,
        day: &str,
        time: &str,
        slot: PlacedSlot,
    ) -> Option<PlacedSlot> {
        self.0
            .entry(department.to_string())
            .or_default()
            .entry(day.to_string())
            .or_default()
            .insert(time.to_string(), slot)
    }

    pub fn get(&self, department: &str, day: &str, time: &str) -> Option<&PlacedSlot> {
        self.0.get(department)?.get(day)?.get(time)
    }

    /// True when the cell holds a fixed slot.
    pub fn holds_fixed(&self, department: &str, day: &str, time: &str) -> bool {
        self.get(department, day, time)
            .is_some_and(|slot| slot.is_fixed)
    }

    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn has_department(&self, department: &str) -> bool {
        self.0.contains_key(department)
    }

    /// Every filled cell as (department, day, time, slot).
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &str, &PlacedSlot)> {
        self.0.iter().flat_map(|(department, days)| {
            days.iter().flat_map(move |(day, times)| {
                times
                    .iter()
                    .map(move |(time, slot)| (department.as_str(), day.as_str(), time.as_str(), slot))
            })
        })
    }

    pub fn department_cells<'a>(
        &'a self,
        department: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str, &'a PlacedSlot)> {
        self.cells()
            .filter(move |(d, _, _, _)| *d == department)
            .map(|(_, day, time, slot)| (day, time, slot))
    }
}

/// Slot counts and per-resource usage for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_slots: usize,
    pub fixed_slots: usize,
    pub generated_slots: usize,
    pub teacher_utilization: BTreeMap<String, usize>,
    pub room_utilization: BTreeMap<RoomId, usize>,
}

/// The final output of the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub timetable: Timetable,
    pub conflicts: Vec<String>,
    pub statistics: Statistics,
}
