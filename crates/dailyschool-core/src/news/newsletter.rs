use std::fmt::Write;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::NewsItem;

use super::{group_by_category, CategoryGroup};

const HEADING: &str = "일간 뉴스레터";
const EMPTY_NOTICE: &str = "오늘 등록된 소식이 없습니다.";
const FOOTER: &str = "이 뉴스레터는 학교 소식통에서 자동으로 생성되었습니다.\n자세한 내용은 웹사이트를 방문해주세요.";

/// Digest of the announcements posted on a single local calendar day.
#[derive(Debug, Clone)]
pub struct Newsletter<'a> {
    pub date: NaiveDate,
    pub sections: Vec<CategoryGroup<'a>>,
}

impl<'a> Newsletter<'a> {
    pub fn for_day(items: &'a [NewsItem], date: NaiveDate) -> Self {
        let todays = items.iter().filter(|item| item.timestamp.date_naive() == date);
        Self {
            date,
            sections: group_by_category(todays),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Date line, e.g. "2024년 3월 5일 화요일".
    pub fn date_display(&self) -> String {
        format!(
            "{}년 {}월 {}일 {}",
            self.date.year(),
            self.date.month(),
            self.date.day(),
            korean_weekday(self.date.weekday())
        )
    }

    /// Plain-text digest.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", HEADING);
        let _ = writeln!(out, "{}", self.date_display());

        if self.is_empty() {
            let _ = writeln!(out, "\n{}", EMPTY_NOTICE);
        }

        for section in &self.sections {
            let _ = writeln!(out, "\n[{}]", section.category);
            for item in &section.items {
                let _ = writeln!(out, "- {}", item.title);
                for line in item.content.lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }

        let _ = writeln!(out, "\n{}", FOOTER);
        out
    }
}

fn korean_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "월요일",
        Weekday::Tue => "화요일",
        Weekday::Wed => "수요일",
        Weekday::Thu => "목요일",
        Weekday::Fri => "금요일",
        Weekday::Sat => "토요일",
        Weekday::Sun => "일요일",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, NewsDraft};
    use crate::news::NewsBoard;
    use chrono::{Local, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .earliest()
            .expect("valid local time")
    }

    fn board() -> NewsBoard {
        let mut board = NewsBoard::new();
        board
            .add_at(NewsDraft::new("Yesterday", "old", Category::Notice), at(2024, 3, 4, 12))
            .unwrap();
        board
            .add_at(NewsDraft::new("Lunch", "Kimchi stew\nRice", Category::MealMenu), at(2024, 3, 5, 9))
            .unwrap();
        board
            .add_at(NewsDraft::new("Assembly", "Gym at 10", Category::Notice), at(2024, 3, 5, 8))
            .unwrap();
        board
    }

    #[test]
    fn test_only_items_from_that_day() {
        let board = board();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let newsletter = Newsletter::for_day(board.items(), date);

        assert_eq!(newsletter.item_count(), 2);
        assert_eq!(newsletter.sections[0].category, Category::MealMenu);
        assert_eq!(newsletter.sections[1].items[0].title, "Assembly");
    }

    #[test]
    fn test_render_digest() {
        let board = board();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let text = Newsletter::for_day(board.items(), date).render();

        assert!(text.starts_with("일간 뉴스레터\n2024년 3월 5일 화요일\n"));
        assert!(text.contains("[급식메뉴]\n- Lunch\n  Kimchi stew\n  Rice\n"));
        assert!(text.contains("[공지사항]\n- Assembly\n"));
        assert!(!text.contains("Yesterday"));
        assert!(text.trim_end().ends_with("방문해주세요."));
    }

    #[test]
    fn test_empty_day() {
        let board = board();
        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let newsletter = Newsletter::for_day(board.items(), date);
        assert!(newsletter.is_empty());
        assert!(newsletter.render().contains(EMPTY_NOTICE));
    }
}
