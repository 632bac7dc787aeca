use crate::data::{
    DAYS, DEFAULT_ROOMS, GenerationResult, PlacedSlot, RoomId, SubjectRequirement, TIME_SLOTS,
    Teacher, Timetable, TimetableInput,
};
use crate::occupancy::{OccupancyIndex, ResourceKind};
use crate::stats;
use itertools::Itertools;
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

/// Knobs that change placement beyond the default first-fit behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Skip teachers who already hold `max_hours_per_week` periods
    /// (fixed slots included).
    pub enforce_max_hours: bool,
}

/// A domain-level problem found while generating. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Two fixed slots hold the same resource in the same period.
    Collision {
        kind: ResourceKind,
        id: String,
        day: String,
        time: String,
    },
    /// A subject/batch pair ran out of free periods before its quota was met.
    Unscheduled {
        subject: String,
        batch: String,
        remaining: u32,
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Collision { kind, id, day, time } => {
                write!(f, "{} conflict: {} at {} {}", kind, id, day, time)
            }
            Conflict::Unscheduled {
                subject,
                batch,
                remaining,
            } => write!(
                f,
                "Could not schedule {} for {} ({} hour(s) remaining)",
                subject, batch, remaining
            ),
        }
    }
}

/// First free (day, time, teacher, room) found for a requirement.
#[derive(Debug, Clone)]
struct Candidate<'a> {
    day: &'static str,
    time: &'static str,
    teacher: &'a Teacher,
    room: &'a str,
}

/// Mutable state of a single generation run.
#[derive(Default)]
struct Run {
    timetable: Timetable,
    occupancy: OccupancyIndex,
    conflicts: Vec<Conflict>,
    teacher_hours: HashMap<String, u32>,
}

/// Places fixed slots, then greedily fills subject hour quotas.
#[derive(Debug, Clone)]
pub struct TimetableGenerator {
    input: TimetableInput,
    rooms: Vec<RoomId>,
    options: GeneratorOptions,
}

impl TimetableGenerator {
    pub fn new(input: TimetableInput) -> Self {
        let rooms = room_pool(&input);
        Self {
            input,
            rooms,
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Rooms the search may use, fixed-slot rooms first.
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    /// Builds the timetable. Same input in the same order gives the same result;
    /// infeasibility only shows up in `conflicts`.
    pub fn generate(&self) -> GenerationResult {
        let start_time = Instant::now();
        info!(
            "Generating timetable for {} teachers, {} fixed slots and {} subject requirements over {} rooms...",
            self.input.teachers.len(),
            self.input.fixed_slots.len(),
            self.input.subject_requirements.len(),
            self.rooms.len()
        );

        let mut run = Run::default();
        self.initialize_timetable(&mut run);

        info!("Placing fixed slots...");
        self.place_fixed_slots(&mut run);

        info!("Generating remaining slots...");
        self.generate_remaining_slots(&mut run);

        let statistics = stats::calculate(
            &run.timetable,
            &run.occupancy,
            &self.input.teachers,
            &self.rooms,
        );
        info!(
            "Generated {} slots ({} fixed, {} generated) with {} conflicts in {:.2?}",
            statistics.total_slots,
            statistics.fixed_slots,
            statistics.generated_slots,
            run.conflicts.len(),
            start_time.elapsed()
        );

        GenerationResult {
            timetable: run.timetable,
            conflicts: run.conflicts.iter().map(ToString::to_string).collect(),
            statistics,
        }
    }

    fn initialize_timetable(&self, run: &mut Run) {
        let departments = self
            .input
            .fixed_slots
            .iter()
            .map(|slot| slot.department.as_str())
            .chain(
                self.input
                    .subject_requirements
                    .iter()
                    .map(|req| req.department.as_str()),
            )
            .unique();
        for department in departments {
            run.timetable.add_department(department);
        }
    }

    // fixed slots are never rejected, only flagged
    fn place_fixed_slots(&self, run: &mut Run) {
        for fixed in &self.input.fixed_slots {
            let slot = PlacedSlot::from(fixed);
            for kind in run.occupancy.occupy_slot(&fixed.day, &fixed.time, &slot) {
                let conflict = Conflict::Collision {
                    kind,
                    id: kind.id_of(&slot).to_string(),
                    day: fixed.day.clone(),
                    time: fixed.time.clone(),
                };
                warn!("{}", conflict);
                run.conflicts.push(conflict);
            }
            if let Some(replaced) =
                run.timetable
                    .place(&fixed.department, &fixed.day, &fixed.time, slot)
            {
                debug!(
                    "Fixed slot {} replaced {} in {} {} {}",
                    fixed.subject, replaced.subject, fixed.department, fixed.day, fixed.time
                );
            }
            *run.teacher_hours.entry(fixed.teacher.clone()).or_default() += 1;
        }
    }

    fn generate_remaining_slots(&self, run: &mut Run) {
        let known_batches: HashSet<&str> = self
            .input
            .classes
            .iter()
            .map(|class| class.name.as_str())
            .collect();

        for req in &self.input.subject_requirements {
            if req.required_teachers > 1 {
                warn!(
                    "{} asks for {} teachers per slot; only one teacher is assigned",
                    req.subject, req.required_teachers
                );
            }
            let teachers: Vec<&Teacher> = self
                .input
                .teachers
                .iter()
                .filter(|teacher| teacher.teaches(&req.subject))
                .collect();
            if teachers.is_empty() {
                debug!("No teacher can take {}", req.subject);
            }

            for batch in &req.batches {
                if !known_batches.is_empty() && !known_batches.contains(batch.as_str()) {
                    warn!("Batch {} of {} is not in the class list", batch, req.subject);
                }

                let mut hours_scheduled = 0;
                while hours_scheduled < req.hours_per_week {
                    match self.find_best_slot(req, batch, &teachers, run) {
                        Some(candidate) => {
                            self.place_generated_slot(req, batch, &candidate, run);
                            hours_scheduled += 1;
                        }
                        None => {
                            let conflict = Conflict::Unscheduled {
                                subject: req.subject.clone(),
                                batch: batch.clone(),
                                remaining: req.hours_per_week - hours_scheduled,
                            };
                            warn!("{}", conflict);
                            run.conflicts.push(conflict);
                            break;
                        }
                    }
                }
            }
        }
    }

    fn find_best_slot<'a>(
        &'a self,
        req: &SubjectRequirement,
        batch: &str,
        teachers: &[&'a Teacher],
        run: &Run,
    ) -> Option<Candidate<'a>> {
        if teachers.is_empty() {
            return None;
        }

        for day in DAYS {
            for time in TIME_SLOTS {
                // fixed cells stay put; generated ones may be overwritten
                if run.timetable.holds_fixed(&req.department, day, time) {
                    continue;
                }
                if run
                    .occupancy
                    .is_occupied(day, time, ResourceKind::Batch, batch)
                {
                    continue;
                }
                for &teacher in teachers {
                    if !teacher.is_available(day, time) {
                        continue;
                    }
                    if self.options.enforce_max_hours
                        && run.teacher_hours.get(&teacher.name).copied().unwrap_or(0)
                            >= teacher.max_hours_per_week
                    {
                        continue;
                    }
                    if run
                        .occupancy
                        .is_occupied(day, time, ResourceKind::Teacher, &teacher.name)
                    {
                        continue;
                    }
                    if let Some(room) = self.find_available_room(day, time, &run.occupancy) {
                        return Some(Candidate {
                            day,
                            time,
                            teacher,
                            room,
                        });
                    }
                }
            }
        }

        None
    }

    fn find_available_room(&self, day: &str, time: &str, occupancy: &OccupancyIndex) -> Option<&str> {
        self.rooms
            .iter()
            .map(String::as_str)
            .find(|room| !occupancy.is_occupied(day, time, ResourceKind::Room, room))
    }

    fn place_generated_slot(
        &self,
        req: &SubjectRequirement,
        batch: &str,
        candidate: &Candidate<'_>,
        run: &mut Run,
    ) {
        let slot = PlacedSlot {
            subject: req.subject.clone(),
            teacher: candidate.teacher.name.clone(),
            room: candidate.room.to_string(),
            batch: batch.to_string(),
            is_fixed: false,
        };
        trace!(
            "Placing {} on {} {} in {}",
            slot,
            candidate.day,
            candidate.time,
            req.department
        );

        let collisions = run
            .occupancy
            .occupy_slot(candidate.day, candidate.time, &slot);
        debug_assert!(collisions.is_empty(), "generated slot double-booked {:?}", collisions);
        if let Some(replaced) =
            run.timetable
                .place(&req.department, candidate.day, candidate.time, slot)
        {
            debug!(
                "{} replaced {} in the {} {} {} cell",
                req.subject, replaced, req.department, candidate.day, candidate.time
            );
        }
        *run
            .teacher_hours
            .entry(candidate.teacher.name.clone())
            .or_default() += 1;
    }
}

/// Rooms seen in fixed slots, then the supplied pool (or the default one).
fn room_pool(input: &TimetableInput) -> Vec<RoomId> {
    let extra: Vec<&str> = match &input.rooms {
        Some(rooms) => rooms.iter().map(String::as_str).collect(),
        None => DEFAULT_ROOMS.to_vec(),
    };
    input
        .fixed_slots
        .iter()
        .map(|slot| slot.room.as_str())
        .chain(extra)
        .unique()
        .map(str::to_string)
        .collect()
}
