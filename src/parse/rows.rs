// src/parse/rows.rs
//! Row segmentation of the layout text.
//!
//! The page text is a fixed table: a week line (`Speiseplan Bistro … KW 47 …`),
//! a header line (`Wochentag  Wok Station  Vegetarisch …`), then one block of lines
//! per day. Every line containing the nutrition marker closes a block:
//!
//! ```text
//!   first line            → titles
//!   lines in between      → descriptions (weekday-name lines dropped)
//!   the marker line       → nutrition
//! ```
//!
//! Blocks are numbered from 0 in order; the number is the day offset from the
//! Monday of the declared ISO week.

use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::consts::{
    COLUMN_HEADERS, HEADER_PREFIX, KCAL_MARKER, MIN_LINES, WEEK_PREFIX, WEEKDAY_PREFIXES,
};
use crate::error::{MenuError, Result};
use crate::parse::columns::Columns;

static WEEK_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{1,2}").expect("valid week regex"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowBlock<'a> {
    pub row: usize,
    pub titles: &'a str,
    pub descriptions: Vec<&'a str>,
    pub nutrition: &'a str,
}

#[derive(Clone, Debug)]
pub struct Layout<'a> {
    pub week: u32,
    /// Monday of `week` in the requested year.
    pub anchor: NaiveDate,
    pub columns: Columns,
    pub blocks: Vec<RowBlock<'a>>,
}

/// Monday of ISO week `week` in `year`.
pub fn week_anchor(year: i32, week: u32) -> Result<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| MenuError::format(format!("week {week} does not exist in {year}")))
}

pub fn segment(text: &str, year: i32) -> Result<Layout<'_>> {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    if lines.len() < MIN_LINES {
        return Err(MenuError::format(format!("input has only {} lines", lines.len())));
    }

    let week = find_week(&lines)?;
    let anchor = week_anchor(year, week)?;

    let header_idx = lines
        .iter()
        .position(|l| l.trim_start().starts_with(HEADER_PREFIX))
        .ok_or_else(|| MenuError::format(format!("\"{HEADER_PREFIX}\" line not found")))?;
    let columns = Columns::locate(lines[header_idx], &COLUMN_HEADERS)?;

    let mut blocks = Vec::new();
    let mut last_terminator = header_idx;
    for i in header_idx + 1..lines.len() {
        if !lines[i].contains(KCAL_MARKER) {
            continue;
        }
        let start = last_terminator + 1;
        let descriptions = if start < i {
            lines[start + 1..i].iter().copied().filter(|l| !is_weekday_line(l)).collect()
        } else {
            Vec::new()
        };
        blocks.push(RowBlock {
            row: blocks.len(),
            titles: lines[start],
            descriptions,
            nutrition: lines[i],
        });
        last_terminator = i;
    }

    tracing::debug!(week, %anchor, blocks = blocks.len(), "segmented layout text");
    Ok(Layout { week, anchor, columns, blocks })
}

fn find_week(lines: &[&str]) -> Result<u32> {
    let line = lines
        .iter()
        .find(|l| l.trim_start().starts_with(WEEK_PREFIX))
        .ok_or_else(|| MenuError::format("failed to locate week number"))?;
    let digits = WEEK_NUMBER
        .find(line)
        .ok_or_else(|| MenuError::format(format!("no week number in {:?}", line.trim())))?;
    digits
        .as_str()
        .parse()
        .map_err(|e| MenuError::format(format!("failed to parse week {:?}: {e}", digits.as_str())))
}

fn is_weekday_line(line: &str) -> bool {
    let t = line.trim();
    WEEKDAY_PREFIXES.iter().any(|d| t.starts_with(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
                        Speiseplan Bistro KW 47
   Wochentag      Wok Station        Vegetarisch        Gericht 2          Gericht 3
   Montag         Pasta-Pfanne       Ofenkartoffel      Rinderroulade      Fischfilet
                  mit Huhn           mit Quark          mit Rotkohl        mit Reis
   16.11.         kcal 528           kcal 410           kcal 790           kcal 502
                  Tageskarte
   Dienstag
                  Nasi Goreng        Gemüsecurry        Schnitzel          Matjes
                  kcal 600           kcal 430           kcal 850           kcal 480
";

    #[test]
    fn anchor_is_monday_of_iso_week() {
        assert_eq!(week_anchor(2020, 47).unwrap(), NaiveDate::from_ymd_opt(2020, 11, 16).unwrap());
        // ISO week 1 of 2021 starts in 2021-01-04
        assert_eq!(week_anchor(2021, 1).unwrap(), NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert!(matches!(week_anchor(2021, 60), Err(MenuError::Format(_))));
    }

    #[test]
    fn segments_blocks_at_nutrition_lines() {
        let layout = segment(DOC, 2020).unwrap();
        assert_eq!(layout.week, 47);
        assert_eq!(layout.anchor, NaiveDate::from_ymd_opt(2020, 11, 16).unwrap());
        assert_eq!(layout.blocks.len(), 2);

        let first = &layout.blocks[0];
        assert_eq!(first.row, 0);
        assert!(first.titles.contains("Pasta-Pfanne"));
        assert_eq!(first.descriptions.len(), 1);
        assert!(first.nutrition.contains("kcal 528"));

        // "Dienstag" line is weekday noise, "Tageskarte" becomes the title line
        let second = &layout.blocks[1];
        assert_eq!(second.row, 1);
        assert!(second.titles.contains("Tageskarte"));
        assert_eq!(second.descriptions.len(), 1);
        assert!(second.descriptions[0].contains("Nasi Goreng"));
    }

    #[test]
    fn missing_week_line_fails() {
        let doc = DOC.replace("Speiseplan Bistro KW 47", "Wochenkarte");
        assert!(matches!(segment(&doc, 2020), Err(MenuError::Format(_))));
    }

    #[test]
    fn week_line_without_number_fails() {
        let doc = DOC.replace("KW 47", "KW ??");
        let err = segment(&doc, 2020).unwrap_err();
        assert!(matches!(err, MenuError::Format(m) if m.contains("no week number")));
    }

    #[test]
    fn missing_header_line_fails() {
        let doc = DOC.replace("Wochentag", "Tag");
        assert!(matches!(segment(&doc, 2020), Err(MenuError::Format(_))));
    }

    #[test]
    fn too_few_lines_fails() {
        assert!(matches!(segment("Speiseplan Bistro KW 1\nWochentag", 2020), Err(MenuError::Format(_))));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let doc = DOC.replace('\n', "\r\n");
        let layout = segment(&doc, 2020).unwrap();
        assert_eq!(layout.blocks.len(), 2);
        assert!(!layout.blocks[0].nutrition.ends_with('\r'));
    }
}
