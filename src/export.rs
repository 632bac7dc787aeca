use std::fmt::Write;

use anyhow::{Result, anyhow};

use crate::data::{DAYS, TIME_SLOTS, Teacher, Timetable};
use crate::stats::department_summaries;

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("failed to flush csv: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// One department's week as a grid: a row per period, a column per day.
pub fn department_csv(timetable: &Timetable, department: &str) -> Result<String> {
    if !timetable.has_department(department) {
        return Err(anyhow!("no timetable for department {department}"));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(std::iter::once("Time").chain(DAYS))?;
    for time in TIME_SLOTS {
        let mut row = vec![time.to_string()];
        for day in DAYS {
            row.push(
                timetable
                    .get(department, day, time)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }
    finish(writer)
}

pub fn summary_csv(timetable: &Timetable) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Department", "Total Classes", "Fixed Classes", "Generated Classes"])?;
    for summary in department_summaries(timetable) {
        writer.write_record([
            summary.department,
            summary.total.to_string(),
            summary.fixed.to_string(),
            summary.generated.to_string(),
        ])?;
    }
    finish(writer)
}

/// The teacher roster, in the same columns the teacher upload reads.
pub fn teachers_csv(teachers: &[Teacher]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["ID".to_string(), "Name".to_string(), "Email".to_string(), "Subjects".to_string()];
    header.extend(DAYS.iter().map(|day| format!("{day}_Availability")));
    header.push("MaxHours".to_string());
    writer.write_record(&header)?;

    for teacher in teachers {
        let mut row = vec![
            teacher.id.clone(),
            teacher.name.clone(),
            teacher.email.clone(),
            teacher.subjects.join(", "),
        ];
        for day in DAYS {
            row.push(
                teacher
                    .availability
                    .get(day)
                    .map(|times| times.join(", "))
                    .unwrap_or_default(),
            );
        }
        row.push(teacher.max_hours_per_week.to_string());
        writer.write_record(&row)?;
    }
    finish(writer)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A standalone HTML page with one table per department, suitable for printing.
pub fn printable_html(timetable: &Timetable) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html>");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<title>College Timetable</title>");
    let _ = writeln!(output, "<style>");
    let _ = writeln!(output, "body {{ font-family: Arial, sans-serif; margin: 20px; }}");
    let _ = writeln!(output, "table {{ border-collapse: collapse; width: 100%; margin-bottom: 30px; }}");
    let _ = writeln!(output, "th, td {{ border: 1px solid #ddd; padding: 8px; text-align: center; }}");
    let _ = writeln!(output, "th {{ background-color: #f2f2f2; }}");
    let _ = writeln!(output, ".fixed {{ background-color: #e3f2fd; }}");
    let _ = writeln!(output, ".generated {{ background-color: #f3e5f5; }}");
    let _ = writeln!(output, "@media print {{ .department {{ page-break-inside: avoid; }} }}");
    let _ = writeln!(output, "</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<h1>College Timetable</h1>");

    for department in timetable.departments() {
        let _ = writeln!(output, "<div class=\"department\">");
        let _ = writeln!(output, "<h2>{} Department</h2>", escape_html(department));
        let _ = writeln!(output, "<table>");
        let _ = write!(output, "<thead><tr><th>Time</th>");
        for day in DAYS {
            let _ = write!(output, "<th>{day}</th>");
        }
        let _ = writeln!(output, "</tr></thead>");
        let _ = writeln!(output, "<tbody>");

        for time in TIME_SLOTS {
            let _ = write!(output, "<tr><td><strong>{time}</strong></td>");
            for day in DAYS {
                match timetable.get(department, day, time) {
                    Some(slot) => {
                        let class = if slot.is_fixed { "fixed" } else { "generated" };
                        let _ = write!(
                            output,
                            "<td class=\"{}\"><div><strong>{}</strong></div><div>{}</div><div>{} - {}</div>{}</td>",
                            class,
                            escape_html(&slot.subject),
                            escape_html(&slot.teacher),
                            escape_html(&slot.room),
                            escape_html(&slot.batch),
                            if slot.is_fixed { "<div><em>[FIXED]</em></div>" } else { "" }
                        );
                    }
                    None => {
                        let _ = write!(output, "<td></td>");
                    }
                }
            }
            let _ = writeln!(output, "</tr>");
        }

        let _ = writeln!(output, "</tbody>");
        let _ = writeln!(output, "</table>");
        let _ = writeln!(output, "</div>");
    }

    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}
