use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub const WEEKDAY_LABELS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// A month grid with Monday as the first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
}

impl MonthView {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { month: self.month + 1, ..self }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { month: self.month - 1, ..self }
        }
    }

    pub fn title(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{} {}", name, self.year)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        match (
            NaiveDate::from_ymd_opt(self.year, self.month, 1),
            NaiveDate::from_ymd_opt(next.year, next.month, 1),
        ) {
            (Some(first), Some(following)) => (following - first).num_days() as u32,
            _ => 0,
        }
    }

    /// Week rows; `None` marks cells belonging to the neighbouring months.
    pub fn weeks(&self) -> Vec<[Option<u32>; 7]> {
        let Some(first) = NaiveDate::from_ymd_opt(self.year, self.month, 1) else {
            return Vec::new();
        };
        let offset = first.weekday().num_days_from_monday() as usize;
        let days = self.days_in_month();

        let mut weeks = Vec::new();
        let mut row = [None; 7];
        let mut col = offset;
        for day in 1..=days {
            row[col] = Some(day);
            col += 1;
            if col == 7 {
                weeks.push(row);
                row = [None; 7];
                col = 0;
            }
        }
        if col > 0 {
            weeks.push(row);
        }
        weeks
    }

    pub fn is_today(&self, day: u32, today: NaiveDate) -> bool {
        today.year() == self.year && today.month() == self.month && today.day() == day
    }

    /// Plain-text rendering with today's date bracketed.
    pub fn render(&self, today: NaiveDate) -> String {
        let mut out = format!("{}\n{}\n", self.title(), WEEKDAY_LABELS.join(" "));
        for week in self.weeks() {
            let cells: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    Some(day) if self.is_today(*day, today) => format!("[{}]", day),
                    Some(day) => format!("{:>2}", day),
                    None => "  ".to_string(),
                })
                .collect();
            out.push_str(cells.join(" ").trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_wraps_the_year() {
        let dec = MonthView { year: 2025, month: 12 };
        assert_eq!(dec.next(), MonthView { year: 2026, month: 1 });
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(MonthView { year: 2026, month: 1 }.prev(), dec);
        assert_eq!(dec.title(), "December 2025");
    }

    #[test]
    fn grid_starts_on_monday() {
        // 1 June 2026 is a Monday, 30 days.
        let june = MonthView { year: 2026, month: 6 };
        let weeks = june.weeks();
        assert_eq!(weeks[0][0], Some(1));
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[4][1], Some(30));
        assert_eq!(weeks[4][2], None);

        // 1 February 2026 is a Sunday.
        let feb = MonthView { year: 2026, month: 2 };
        let weeks = feb.weeks();
        assert_eq!(weeks[0][..6], [None; 6]);
        assert_eq!(weeks[0][6], Some(1));
        assert_eq!(feb.days_in_month(), 28);
    }

    #[test]
    fn leap_february() {
        assert_eq!(MonthView { year: 2028, month: 2 }.days_in_month(), 29);
    }

    #[test]
    fn render_marks_today() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
        let text = MonthView::containing(today).render(today);
        assert!(text.starts_with("June 2026\nMo Tu We"));
        assert!(text.contains("[3]"));
    }
}
