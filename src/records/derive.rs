use chrono::Datelike;

use super::{Certificates, Grades};

/// Label shown for a certificate that has not been earned.
pub const INCOMPLETE_LABEL: &str = "Incompleted";

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Color tokens for tags. The theme decides what each token looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagColor {
    Default,
    Cyan,
    Green,
    Geekblue,
    Volcano,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateColors {
    pub english: TagColor,
    pub scrum: TagColor,
    pub cyber_security: TagColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeTone {
    Positive,
    Negative,
}

pub fn certificate_status_colors(certificates: &Certificates) -> CertificateColors {
    let pick = |value: Option<&str>, complete: TagColor| {
        if value.is_some() {
            complete
        } else {
            TagColor::Volcano
        }
    };
    CertificateColors {
        english: pick(certificates.english(), TagColor::Default),
        scrum: pick(certificates.scrum(), TagColor::Cyan),
        cyber_security: pick(certificates.cyber_security(), TagColor::Green),
    }
}

pub fn certificate_label(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => INCOMPLETE_LABEL,
    }
}

/// Formats a date as `"March 3rd, 2024"`.
pub fn format_ordinal_date<D: Datelike>(date: &D) -> String {
    let day = date.day();
    format!(
        "{} {}{}, {}",
        MONTH_NAMES[date.month0() as usize],
        day,
        ordinal_suffix(day),
        date.year()
    )
}

/// English ordinal suffix for a day number. 11, 12 and 13 always take "th".
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Sum of every period score; an empty grade set sums to zero. Saturates at
/// the `i64` bounds.
pub fn aggregate_score(grades: &Grades) -> i64 {
    grades
        .iter()
        .fold(0i64, |total, (_, score)| total.saturating_add(score))
}

/// `"Test"` followed by the characters at positions 4 and 5 of the period key.
pub fn grade_chip_label(period: &str) -> String {
    let suffix: String = period.chars().skip(4).take(2).collect();
    format!("Test{suffix}")
}

pub fn grade_tone(score: i64) -> GradeTone {
    if score > 0 {
        GradeTone::Positive
    } else {
        GradeTone::Negative
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn certificates(english: &str, scrum: &str, cyber: &str) -> Certificates {
        let field = |value: &str| (!value.is_empty()).then(|| value.to_string());
        Certificates {
            english: field(english),
            scrum: field(scrum),
            cyber_security: field(cyber),
        }
    }

    #[test]
    fn all_certificates_complete() {
        let colors = certificate_status_colors(&certificates("C1", "PSM I", "CEH"));
        assert_eq!(
            colors,
            CertificateColors {
                english: TagColor::Default,
                scrum: TagColor::Cyan,
                cyber_security: TagColor::Green,
            }
        );
    }

    #[test]
    fn missing_certificates_are_volcano() {
        let colors = certificate_status_colors(&Certificates::default());
        assert_eq!(colors.english, TagColor::Volcano);
        assert_eq!(colors.scrum, TagColor::Volcano);
        assert_eq!(colors.cyber_security, TagColor::Volcano);
    }

    #[test]
    fn empty_strings_are_incomplete() {
        let input = Certificates {
            english: Some(String::new()),
            scrum: Some("PSM I".to_string()),
            cyber_security: Some(String::new()),
        };
        let colors = certificate_status_colors(&input);
        assert_eq!(colors.english, TagColor::Volcano);
        assert_eq!(colors.scrum, TagColor::Cyan);
        assert_eq!(colors.cyber_security, TagColor::Volcano);
        // same input, same output
        assert_eq!(colors, certificate_status_colors(&input));
    }

    #[test]
    fn certificate_label_falls_back() {
        assert_eq!(certificate_label(Some("B2")), "B2");
        assert_eq!(certificate_label(Some("")), INCOMPLETE_LABEL);
        assert_eq!(certificate_label(None), INCOMPLETE_LABEL);
    }

    #[test]
    fn ordinal_suffixes() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (31, "st"),
        ];
        for (day, expected) in cases {
            assert_eq!(ordinal_suffix(day), expected, "day {day}");
        }
        assert_eq!(ordinal_suffix(111), "th");
        assert_eq!(ordinal_suffix(101), "st");
    }

    #[test]
    fn formats_ordinal_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(format_ordinal_date(&date), "March 3rd, 2024");
        let date = NaiveDate::from_ymd_opt(2025, 12, 12).unwrap();
        assert_eq!(format_ordinal_date(&date), "December 12th, 2025");
        let date = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
        assert_eq!(format_ordinal_date(&date), "January 21st, 2026");
    }

    #[test]
    fn aggregate_is_unclamped_and_zero_for_empty() {
        let grades: Grades = [
            ("w0102", 30),
            ("w0304", 30),
            ("week0506", 20),
            ("week0708", 20),
            ("week0910", 10),
            ("week1112", 10),
        ]
        .into_iter()
        .collect();
        assert_eq!(aggregate_score(&grades), 120);
        assert_eq!(aggregate_score(&Grades::default()), 0);

        let negative: Grades = [("w0102", -40), ("w0304", 5)].into_iter().collect();
        assert_eq!(aggregate_score(&negative), -35);
    }

    #[test]
    fn aggregate_saturates_on_overflow() {
        let huge: Grades = [("w0102", i64::MAX), ("w0304", 1)].into_iter().collect();
        assert_eq!(aggregate_score(&huge), i64::MAX);
        let tiny: Grades = [("w0102", i64::MIN), ("w0304", -1)].into_iter().collect();
        assert_eq!(aggregate_score(&tiny), i64::MIN);
    }

    #[test]
    fn chip_labels_slice_the_period_key() {
        assert_eq!(grade_chip_label("w0102"), "Test2");
        assert_eq!(grade_chip_label("w0304"), "Test4");
        assert_eq!(grade_chip_label("week0506"), "Test05");
        assert_eq!(grade_chip_label("week1112"), "Test11");
        assert_eq!(grade_chip_label("wk"), "Test");
    }

    #[test]
    fn zero_is_a_negative_tone() {
        assert_eq!(grade_tone(1), GradeTone::Positive);
        assert_eq!(grade_tone(0), GradeTone::Negative);
        assert_eq!(grade_tone(-5), GradeTone::Negative);
    }
}
