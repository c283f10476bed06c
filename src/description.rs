//! Extraction of the metadata that school planners embed in event descriptions
//!
//! The feed stores a few labelled lines in the `DESCRIPTION` of every event, e.g.
//! ```text
//! Leerkrachten: J. Doe
//! Klassen en/of leerlingen: 5A
//! Vakken: Wiskunde
//! Opdrachttype: Huiswerk
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const TEACHER_LABEL: &str = "Leerkrachten:";
pub const CLASS_LABEL: &str = "Klassen en/of leerlingen:";
pub const SUBJECT_LABEL: &str = "Vakken:";
pub const TYPE_LABEL: &str = "Opdrachttype:";

static TEACHER_RE: Lazy<Regex> = Lazy::new(|| labelled_line(TEACHER_LABEL));
static CLASS_RE: Lazy<Regex> = Lazy::new(|| labelled_line(CLASS_LABEL));
static SUBJECT_RE: Lazy<Regex> = Lazy::new(|| labelled_line(SUBJECT_LABEL));
static TYPE_RE: Lazy<Regex> = Lazy::new(|| labelled_line(TYPE_LABEL));

/// `<label>` followed by optional whitespace, then anything up to the end of the line (or of the text)
fn labelled_line(label: &str) -> Regex {
    Regex::new(&format!(r"{}\s*(.*?)(?:\r?\n|$)", regex::escape(label)))
        .expect("valid labelled line regex")
}

/// The metadata found in a description. Every field is empty when its label is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionFields {
    pub teacher: String,
    pub class: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub assignment_type: String,
}

impl DescriptionFields {
    /// Fill the fields that are still empty with the values of `other`
    fn fill_missing_from(&mut self, other: DescriptionFields) {
        fill(&mut self.teacher, other.teacher);
        fill(&mut self.class, other.class);
        fill(&mut self.subject, other.subject);
        fill(&mut self.assignment_type, other.assignment_type);
    }
}

fn fill(field: &mut String, candidate: String) {
    if field.is_empty() {
        *field = candidate;
    }
}

/// Extract the labelled fields of a description.
///
/// A single pass of labelled patterns is tried first. When it leaves the subject or the assignment type empty,
/// the description is scanned line by line and the missing fields are taken from there.
/// This never fails.
pub fn mine(description: &str) -> DescriptionFields {
    let mut fields = mine_patterns(description);

    if fields.subject.is_empty() || fields.assignment_type.is_empty() {
        log::trace!("Incomplete description fields {:?}, scanning line by line", fields);
        fields.fill_missing_from(mine_lines(description));
    }

    fields
}

/// The primary strategy: one pattern per label, the first occurrence wins
pub fn mine_patterns(description: &str) -> DescriptionFields {
    let capture = |re: &Regex| {
        re.captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    DescriptionFields {
        teacher: capture(&TEACHER_RE),
        class: capture(&CLASS_RE),
        subject: capture(&SUBJECT_RE),
        assignment_type: capture(&TYPE_RE),
    }
}

/// The fallback strategy: every line is tested against the labels, the last occurrence wins
pub fn mine_lines(description: &str) -> DescriptionFields {
    let mut fields = DescriptionFields::default();

    for line in description.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(rest) = line.strip_prefix(TEACHER_LABEL) {
            fields.teacher = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(CLASS_LABEL) {
            fields.class = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(SUBJECT_LABEL) {
            fields.subject = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(TYPE_LABEL) {
            fields.assignment_type = rest.trim().to_string();
        }
    }

    fields
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mine_description() {
        let fields = mine("Leerkrachten: J. Doe\nVakken: Math\nOpdrachttype: Huiswerk\n");
        assert_eq!(fields, DescriptionFields {
            teacher: String::from("J. Doe"),
            class: String::new(),
            subject: String::from("Math"),
            assignment_type: String::from("Huiswerk"),
        });
    }

    #[test]
    fn test_all_labels_and_crlf() {
        let text = "Leerkrachten: A. Peeters\r\nKlassen en/of leerlingen: 5A, 5B\r\nVakken: Wiskunde\r\nOpdrachttype: Grote toets";
        let fields = mine(text);
        assert_eq!(fields.teacher, "A. Peeters");
        assert_eq!(fields.class, "5A, 5B");
        assert_eq!(fields.subject, "Wiskunde");
        assert_eq!(fields.assignment_type, "Grote toets");
    }

    #[test]
    fn test_no_space_after_colon() {
        // Both strategies tolerate a missing space after the colon
        assert_eq!(mine_patterns("Vakken:Math").subject, "Math");
        assert_eq!(mine_lines("Vakken:Math").subject, "Math");
        assert_eq!(mine("Leerkrachten: X\nVakken:Math").subject, "Math");
    }

    #[test]
    fn test_fallback_fills_only_missing_fields() {
        let mut primary = DescriptionFields {
            teacher: String::from("From patterns"),
            ..DescriptionFields::default()
        };
        primary.fill_missing_from(DescriptionFields {
            teacher: String::from("From lines"),
            subject: String::from("Math"),
            ..DescriptionFields::default()
        });
        assert_eq!(primary.teacher, "From patterns");
        assert_eq!(primary.subject, "Math");
    }

    #[test]
    fn test_label_in_the_middle_of_a_line() {
        // Only the pattern strategy finds labels that do not start a line
        let text = "Details - Vakken: Frans";
        assert_eq!(mine_patterns(text).subject, "Frans");
        assert_eq!(mine_lines(text).subject, "");
        assert_eq!(mine(text).subject, "Frans");
    }

    #[test]
    fn test_empty_description() {
        assert_eq!(mine(""), DescriptionFields::default());
        assert_eq!(mine("Just some text\nwithout labels"), DescriptionFields::default());
    }
}
