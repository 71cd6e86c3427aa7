//! Plain-text rendering of service results.

use chrono::NaiveDate;
use shiftcheck_core::{
    period_label, CalendarSummary, ChecklistApi, ChecklistService, DaySummary, PreferenceStore,
    ScheduleEntry, SessionContext,
};
use std::fmt::Write;
use std::path::Path;

/// Visible checklist lines followed by progress and due-count lines.
pub fn checklist<A, P>(service: &ChecklistService<A, P>, today: NaiveDate) -> String
where
    A: ChecklistApi,
    P: PreferenceStore,
{
    let context = service.context();
    let state = service.engine().state();
    let visible = service.visible_items(today);
    let mut out = String::new();

    let _ = write!(out, "{} ({})", context.day_key(), context.lang.code());
    if !service.filters().is_unrestricted() {
        out.push_str(" [filtered]");
    }
    out.push('\n');
    for item in &visible {
        let mark = if state.is_checked_by(&item.id, &context.user) {
            "x"
        } else if state.is_checked(&item.id) {
            "~"
        } else {
            " "
        };
        let _ = write!(
            out,
            "[{mark}] {:<12} {} | {} | {}",
            item.id,
            item.label(context.lang),
            period_label(item.period_days, context.lang),
            item.equipment_tag()
        );
        if let Some(users) = state.checked.get(&item.id) {
            let names: Vec<&str> = users.keys().map(String::as_str).collect();
            let _ = write!(out, " ({})", names.join(", "));
        }
        out.push('\n');
    }

    let stats = service.stats(today);
    let _ = writeln!(
        out,
        "{}/{} checked, {}%",
        stats.checked, stats.total, stats.progress
    );
    out.push_str(&day_totals(&service.day_summary()));
    out
}

/// Whole-catalog counts for the day, independent of filters.
pub fn day_totals(summary: &DaySummary) -> String {
    let mut out = format!(
        "day: {} due, {} checked",
        summary.total_due, summary.total_checked
    );
    if !summary.period_due_counts.is_empty() {
        let periods: Vec<String> = summary
            .period_due_counts
            .iter()
            .map(|(period, count)| format!("{period}={count}"))
            .collect();
        let _ = write!(out, " (due by period: {})", periods.join(" "));
    }
    out.push('\n');
    out
}

pub fn schedule(entry: &ScheduleEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} status={}", entry.date, entry.line, entry.status);
    if !entry.schedule.is_empty() {
        let _ = writeln!(out, "schedule: {}", entry.schedule);
    }
    if !entry.notes.is_empty() {
        let _ = writeln!(out, "notes: {}", entry.notes);
    }
    if !entry.updated_by.is_empty() {
        let _ = writeln!(out, "updated_by: {}", entry.updated_by);
    }
    out
}

/// One line per day: `date submitted checked/due`.
pub fn summary(summary: &CalendarSummary) -> String {
    let mut out = String::new();
    for (date, day) in &summary.summary_data {
        let _ = writeln!(
            out,
            "{date} {} {}/{}",
            if day.submitted { "submitted" } else { "-" },
            day.total_checked,
            day.total_due
        );
    }
    let _ = writeln!(out, "items={}", summary.total_master_items);
    out
}

pub fn context(context: &SessionContext, log_dir: Option<&Path>) -> String {
    let user = if context.user.is_empty() {
        "(not set)"
    } else {
        context.user.as_str()
    };
    let log_dir = log_dir.map_or_else(|| "(off)".to_string(), |dir| dir.display().to_string());
    format!(
        "user={user}\nline={}\nlang={}\nlog_dir={log_dir}\n",
        context.line,
        context.lang.code()
    )
}

#[cfg(test)]
mod tests {
    use super::{context, day_totals, schedule, summary};
    use chrono::NaiveDate;
    use shiftcheck_core::{
        CalendarSummary, DaySummary, Lang, LineStatus, ScheduleEntry, SessionContext,
    };
    use std::path::Path;

    #[test]
    fn schedule_omits_empty_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut entry = ScheduleEntry::empty(date, "Line1");
        entry.status = LineStatus::Maintenance;
        entry.notes = "roller swap".to_string();

        let text = schedule(&entry);
        assert_eq!(
            text,
            "2024-03-04 Line1 status=maintenance\nnotes: roller swap\n"
        );
    }

    #[test]
    fn summary_lists_days_in_order() {
        let mut data = CalendarSummary::default();
        data.total_master_items = 4;
        data.summary_data.insert(
            "2024-03-02".to_string(),
            DaySummary {
                submitted: true,
                total_checked: 3,
                total_due: 4,
                ..DaySummary::default()
            },
        );
        data.summary_data
            .insert("2024-03-01".to_string(), DaySummary::default());

        assert_eq!(
            summary(&data),
            "2024-03-01 - 0/0\n2024-03-02 submitted 3/4\nitems=4\n"
        );
    }

    #[test]
    fn day_totals_list_due_counts_by_period() {
        let mut day = DaySummary {
            total_due: 3,
            total_checked: 1,
            ..DaySummary::default()
        };
        assert_eq!(day_totals(&day), "day: 3 due, 1 checked\n");

        day.period_due_counts.insert("1".to_string(), 2);
        day.period_due_counts.insert("custom".to_string(), 1);
        assert_eq!(
            day_totals(&day),
            "day: 3 due, 1 checked (due by period: 1=2 custom=1)\n"
        );
    }

    #[test]
    fn context_shows_unset_user_and_log_dir() {
        let session = SessionContext {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            line: "Line1".to_string(),
            user: String::new(),
            lang: Lang::En,
        };
        assert_eq!(
            context(&session, None),
            "user=(not set)\nline=Line1\nlang=en\nlog_dir=(off)\n"
        );
        assert!(context(&session, Some(Path::new("/var/log/shiftcheck")))
            .ends_with("log_dir=/var/log/shiftcheck\n"));
    }
}
