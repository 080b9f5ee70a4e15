use std::collections::BTreeSet;

use super::{KNOWN_STACKS, StudentRecord, TagColor, certificate_label, certificate_status_colors};

/// Color of the single tag rendered in the Stack column.
pub const STACK_TAG_COLOR: TagColor = TagColor::Geekblue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Batch,
    Name,
    Contact,
    Stack,
    Certifications,
    Grades,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Batch,
        Column::Name,
        Column::Contact,
        Column::Stack,
        Column::Certifications,
        Column::Grades,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Batch => "Batch",
            Column::Name => "Name",
            Column::Contact => "Contact",
            Column::Stack => "Stack",
            Column::Certifications => "Certifications",
            Column::Grades => "Grades",
        }
    }

    pub fn is_sortable(self) -> bool {
        matches!(self, Column::Batch)
    }

    pub fn is_filterable(self) -> bool {
        matches!(self, Column::Stack)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortOrder {
    /// none → ascending → descending → none
    pub fn next(self) -> Self {
        match self {
            SortOrder::None => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::None,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortOrder::None => "",
            SortOrder::Ascending => " ▲",
            SortOrder::Descending => " ▼",
        }
    }
}

/// Stable numeric sort on `batch`. `SortOrder::None` keeps store order.
pub fn sort_by_batch(rows: &mut [&StudentRecord], order: SortOrder) {
    match order {
        SortOrder::None => {}
        SortOrder::Ascending => rows.sort_by(|a, b| a.batch.cmp(&b.batch)),
        SortOrder::Descending => rows.sort_by(|a, b| b.batch.cmp(&a.batch)),
    }
}

/// Multi-select filter over the Stack column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackFilter {
    selected: BTreeSet<String>,
}

impl StackFilter {
    pub fn options() -> &'static [&'static str] {
        &KNOWN_STACKS
    }

    pub fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    pub fn toggle(&mut self, value: &str) {
        if !self.selected.remove(value) {
            self.selected.insert(value.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// A record passes when any selected value is a prefix of its stack.
    /// An empty selection passes everything.
    pub fn matches(&self, record: &StudentRecord) -> bool {
        if self.selected.is_empty() {
            return true;
        }
        self.selected
            .iter()
            .any(|value| record.stack.starts_with(value.as_str()))
    }
}

impl<S: Into<String>> FromIterator<S> for StackFilter {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            selected: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub label: String,
    pub color: TagColor,
}

/// The english, scrum and cyber security tags of the Certifications column.
pub fn certificate_tags(record: &StudentRecord) -> [Tag; 3] {
    let colors = certificate_status_colors(&record.certificates);
    let certificates = &record.certificates;
    let tag = |value: Option<&str>, color| Tag {
        label: certificate_label(value).to_string(),
        color,
    };
    [
        tag(certificates.english(), colors.english),
        tag(certificates.scrum(), colors.scrum),
        tag(certificates.cyber_security(), colors.cyber_security),
    ]
}

pub fn stack_tag(record: &StudentRecord) -> Tag {
    Tag {
        label: record.stack.clone(),
        color: STACK_TAG_COLOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Phone,
    Email,
    Github,
    Codepen,
    Codewars,
}

impl ContactKind {
    pub fn label(self) -> &'static str {
        match self {
            ContactKind::Phone => "Phone",
            ContactKind::Email => "Email",
            ContactKind::Github => "GitHub",
            ContactKind::Codepen => "CodePen",
            ContactKind::Codewars => "Codewars",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ContactKind::Phone => "☎",
            ContactKind::Email => "✉",
            ContactKind::Github => "GH",
            ContactKind::Codepen => "CP",
            ContactKind::Codewars => "CW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    pub kind: ContactKind,
    pub target: String,
    /// The raw value the link was built from was empty.
    pub is_empty: bool,
}

/// The five links of the Contact column, in display order. Empty values are
/// kept so the row always shows all five affordances.
pub fn contact_links(record: &StudentRecord) -> [ContactLink; 5] {
    let link = |kind, raw: &str, target: String| ContactLink {
        kind,
        target,
        is_empty: raw.trim().is_empty(),
    };
    [
        link(
            ContactKind::Phone,
            &record.phone,
            format!("tel:{}", record.phone),
        ),
        link(
            ContactKind::Email,
            &record.email,
            format!("mailto:{}", record.email),
        ),
        link(
            ContactKind::Github,
            &record.profiles.github,
            record.profiles.github.clone(),
        ),
        link(
            ContactKind::Codepen,
            &record.profiles.codepen,
            record.profiles.codepen.clone(),
        ),
        link(
            ContactKind::Codewars,
            &record.profiles.codewars,
            record.profiles.codewars.clone(),
        ),
    ]
}
