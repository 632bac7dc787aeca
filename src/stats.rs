use crate::data::{RoomId, Statistics, Teacher, Timetable};
use crate::occupancy::{OccupancyIndex, ResourceKind};
use serde::Serialize;

/// Slot counts for one department, as shown on the summary sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    pub total: usize,
    pub fixed: usize,
    pub generated: usize,
}

/// Counts grid cells and per-resource usage once a run has finished.
///
/// Utilization counts index entries, so a teacher or room taken by two
/// colliding fixed slots in the same period counts once.
pub fn calculate(
    timetable: &Timetable,
    occupancy: &OccupancyIndex,
    teachers: &[Teacher],
    rooms: &[RoomId],
) -> Statistics {
    let fixed_slots = timetable.cells().filter(|(_, _, _, slot)| slot.is_fixed).count();
    let total_slots = timetable.cells().count();

    let teacher_utilization = teachers
        .iter()
        .map(|teacher| {
            (
                teacher.name.clone(),
                occupancy.count_for(ResourceKind::Teacher, &teacher.name),
            )
        })
        .collect();
    let room_utilization = rooms
        .iter()
        .map(|room| (room.clone(), occupancy.count_for(ResourceKind::Room, room)))
        .collect();

    Statistics {
        total_slots,
        fixed_slots,
        generated_slots: total_slots - fixed_slots,
        teacher_utilization,
        room_utilization,
    }
}

pub fn department_summaries(timetable: &Timetable) -> Vec<DepartmentSummary> {
    timetable
        .departments()
        .map(|department| {
            let (total, fixed) = timetable
                .department_cells(department)
                .fold((0, 0), |(total, fixed), (_, _, slot)| {
                    (total + 1, fixed + usize::from(slot.is_fixed))
                });
            DepartmentSummary {
                department: department.to_string(),
                total,
                fixed,
                generated: total - fixed,
            }
        })
        .collect()
}
