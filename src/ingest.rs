//! Reads the three uploads (teachers, fixed slots, subject requirements)
//! from CSV and turns them into typed records.
//!
//! Column names follow the upload templates produced by [`sample_csv`].
//! Rows with missing required values are rejected with their 1-based
//! data row number; optional columns fall back to the documented defaults.

use crate::data::{DAYS, FixedSlot, SubjectRequirement, TIME_SLOTS, Teacher};
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;

const DEFAULT_MAX_HOURS: u32 = 20;
const DEFAULT_HOURS_PER_WEEK: u32 = 3;
const DEFAULT_REQUIRED_TEACHERS: u32 = 1;
const LUNCH_SLOT: &str = "12:00-1:00";

/// Which of the three uploads a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Teachers,
    FixedSlots,
    Subjects,
}

impl FromStr for UploadKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "teachers" => Ok(UploadKind::Teachers),
            "fixed-slots" => Ok(UploadKind::FixedSlots),
            "subjects" => Ok(UploadKind::Subjects),
            other => Err(anyhow!("unknown upload kind: {other}")),
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadKind::Teachers => "teachers",
            UploadKind::FixedSlots => "fixed-slots",
            UploadKind::Subjects => "subjects",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
struct TeacherRow {
    #[serde(rename = "ID", default)]
    id: Option<String>,
    #[serde(rename = "Name", alias = "Teacher", default)]
    name: Option<String>,
    #[serde(rename = "Email", default)]
    email: Option<String>,
    #[serde(rename = "Subjects", default)]
    subjects: Option<String>,
    #[serde(rename = "Monday_Availability", alias = "Monday", default)]
    monday: Option<String>,
    #[serde(rename = "Tuesday_Availability", alias = "Tuesday", default)]
    tuesday: Option<String>,
    #[serde(rename = "Wednesday_Availability", alias = "Wednesday", default)]
    wednesday: Option<String>,
    #[serde(rename = "Thursday_Availability", alias = "Thursday", default)]
    thursday: Option<String>,
    #[serde(rename = "Friday_Availability", alias = "Friday", default)]
    friday: Option<String>,
    #[serde(rename = "MaxHours", default)]
    max_hours: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixedSlotRow {
    #[serde(rename = "Department", default)]
    department: Option<String>,
    #[serde(rename = "Subject", default)]
    subject: Option<String>,
    #[serde(rename = "Faculty", alias = "Teacher", default)]
    faculty: Option<String>,
    #[serde(rename = "Day", default)]
    day: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<String>,
    #[serde(rename = "Room", default)]
    room: Option<String>,
    #[serde(rename = "Batch", alias = "Class", default)]
    batch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    #[serde(rename = "Subject", default)]
    subject: Option<String>,
    #[serde(rename = "Department", default)]
    department: Option<String>,
    #[serde(rename = "HoursPerWeek", default)]
    hours_per_week: Option<String>,
    #[serde(rename = "Batches", default)]
    batches: Option<String>,
    #[serde(rename = "RequiredTeachers", default)]
    required_teachers: Option<String>,
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn required(value: Option<String>, column: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => bail!("missing required column {column}"),
    }
}

fn number(value: Option<String>, column: &str, default: u32) -> Result<u32> {
    match value {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .with_context(|| format!("{column} is not a whole number: {v}")),
        _ => Ok(default),
    }
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_availability() -> Vec<String> {
    TIME_SLOTS
        .iter()
        .filter(|slot| **slot != LUNCH_SLOT)
        .map(|slot| slot.to_string())
        .collect()
}

fn default_email(name: &str) -> String {
    format!(
        "{}@college.edu",
        name.split_whitespace().collect::<Vec<_>>().join(".").to_lowercase()
    )
}

impl TeacherRow {
    fn into_teacher(self, row: usize) -> Result<Teacher> {
        let name = required(self.name, "Name")?;
        let subjects = comma_list(&required(self.subjects, "Subjects")?);
        let per_day = [self.monday, self.tuesday, self.wednesday, self.thursday, self.friday];
        let availability: BTreeMap<String, Vec<String>> = DAYS
            .iter()
            .zip(per_day)
            .map(|(day, cell)| {
                let times = match cell.as_deref().map(comma_list) {
                    Some(times) if !times.is_empty() => times,
                    _ => default_availability(),
                };
                (day.to_string(), times)
            })
            .collect();

        Ok(Teacher {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("teacher-{row}")),
            email: self
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| default_email(&name)),
            name,
            subjects,
            availability,
            max_hours_per_week: number(self.max_hours, "MaxHours", DEFAULT_MAX_HOURS)?,
        })
    }
}

impl FixedSlotRow {
    fn into_fixed_slot(self) -> Result<FixedSlot> {
        Ok(FixedSlot {
            department: required(self.department, "Department")?,
            subject: required(self.subject, "Subject")?,
            teacher: required(self.faculty, "Faculty")?,
            day: required(self.day, "Day")?,
            time: required(self.time, "Time")?,
            room: required(self.room, "Room")?,
            batch: required(self.batch, "Batch")?,
        })
    }
}

impl SubjectRow {
    fn into_requirement(self) -> Result<SubjectRequirement> {
        let batches = comma_list(&required(self.batches, "Batches")?);
        if batches.is_empty() {
            bail!("Batches lists no batch");
        }
        Ok(SubjectRequirement {
            subject: required(self.subject, "Subject")?,
            department: required(self.department, "Department")?,
            hours_per_week: number(self.hours_per_week, "HoursPerWeek", DEFAULT_HOURS_PER_WEEK)?,
            batches,
            required_teachers: number(
                self.required_teachers,
                "RequiredTeachers",
                DEFAULT_REQUIRED_TEACHERS,
            )?,
        })
    }
}

pub fn read_teachers<R: io::Read>(reader: R) -> Result<Vec<Teacher>> {
    let mut reader = csv_reader(reader);
    let mut teachers = Vec::new();
    for (i, result) in reader.deserialize::<TeacherRow>().enumerate() {
        let row = i + 1;
        let teacher = result
            .map_err(anyhow::Error::from)
            .and_then(|r| r.into_teacher(row))
            .with_context(|| format!("teachers row {row}"))?;
        teachers.push(teacher);
    }
    Ok(teachers)
}

pub fn read_fixed_slots<R: io::Read>(reader: R) -> Result<Vec<FixedSlot>> {
    let mut reader = csv_reader(reader);
    let mut slots = Vec::new();
    for (i, result) in reader.deserialize::<FixedSlotRow>().enumerate() {
        let slot = result
            .map_err(anyhow::Error::from)
            .and_then(FixedSlotRow::into_fixed_slot)
            .with_context(|| format!("fixed slots row {}", i + 1))?;
        slots.push(slot);
    }
    Ok(slots)
}

pub fn read_subject_requirements<R: io::Read>(reader: R) -> Result<Vec<SubjectRequirement>> {
    let mut reader = csv_reader(reader);
    let mut requirements = Vec::new();
    for (i, result) in reader.deserialize::<SubjectRow>().enumerate() {
        let requirement = result
            .map_err(anyhow::Error::from)
            .and_then(SubjectRow::into_requirement)
            .with_context(|| format!("subjects row {}", i + 1))?;
        requirements.push(requirement);
    }
    Ok(requirements)
}

/// A filled-in template for `kind`, ready to be offered as a download.
pub fn sample_csv(kind: UploadKind) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    match kind {
        UploadKind::Teachers => {
            writer.write_record([
                "ID",
                "Name",
                "Email",
                "Subjects",
                "Monday_Availability",
                "Tuesday_Availability",
                "Wednesday_Availability",
                "Thursday_Availability",
                "Friday_Availability",
                "MaxHours",
            ])?;
            writer.write_record([
                "T001",
                "Dr. John Smith",
                "john.smith@college.edu",
                "Data Structures, Algorithms",
                "9:00-10:00, 10:00-11:00, 2:00-3:00",
                "9:00-10:00, 11:00-12:00, 3:00-4:00",
                "10:00-11:00, 2:00-3:00, 3:00-4:00",
                "9:00-10:00, 10:00-11:00, 2:00-3:00",
                "9:00-10:00, 11:00-12:00",
                "20",
            ])?;
            writer.write_record([
                "T002",
                "Prof. Sarah Johnson",
                "sarah.johnson@college.edu",
                "Database Systems, Web Development",
                "10:00-11:00, 11:00-12:00, 3:00-4:00",
                "9:00-10:00, 2:00-3:00, 3:00-4:00",
                "9:00-10:00, 11:00-12:00, 2:00-3:00",
                "10:00-11:00, 11:00-12:00, 3:00-4:00",
                "9:00-10:00, 10:00-11:00, 2:00-3:00",
                "18",
            ])?;
        }
        UploadKind::FixedSlots => {
            writer.write_record(["Department", "Subject", "Faculty", "Day", "Time", "Room", "Batch"])?;
            writer.write_record([
                "Computer Science",
                "Data Structures",
                "Dr. John Smith",
                "Monday",
                "9:00-10:00",
                "CS-101",
                "CSE-A",
            ])?;
            writer.write_record([
                "Computer Science",
                "Database Systems",
                "Prof. Sarah Johnson",
                "Tuesday",
                "10:00-11:00",
                "CS-102",
                "CSE-B",
            ])?;
        }
        UploadKind::Subjects => {
            writer.write_record(["Subject", "Department", "HoursPerWeek", "Batches", "RequiredTeachers"])?;
            writer.write_record(["Data Structures", "Computer Science", "4", "CSE-A, CSE-B", "1"])?;
            writer.write_record([
                "Database Systems",
                "Computer Science",
                "3",
                "CSE-A, CSE-B, CSE-C",
                "2",
            ])?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush sample {kind} csv: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}
