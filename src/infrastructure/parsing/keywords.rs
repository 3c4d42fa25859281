//! Bilingual header keyword tables
//!
//! Headers are matched after [`normalize_key`](super::text::normalize_key),
//! so keywords here are lowercase with single spaces. Short Vietnamese words
//! that occur inside other headers (`họ`, `tên`, `anh`) only match a whole
//! cell.

use crate::domain::CanonicalField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// Header contains the keyword
    Contains(&'static str),
    /// Header is exactly the keyword
    Exact(&'static str),
}

impl Keyword {
    pub fn matches(self, header: &str) -> bool {
        match self {
            Self::Contains(keyword) => header.contains(keyword),
            Self::Exact(keyword) => header == keyword,
        }
    }
}

/// One canonical field and the header keywords that select it
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: CanonicalField,
    pub keywords: &'static [Keyword],
}

impl ColumnRule {
    pub fn matches(&self, header: &str) -> bool {
        self.keywords.iter().any(|keyword| keyword.matches(header))
    }
}

use Keyword::{Contains, Exact};

/// Evaluated top to bottom; the first rule that matches a header wins
pub static COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        field: CanonicalField::StudentId,
        keywords: &[
            Contains("mã sv"),
            Contains("mã số"),
            Contains("mã học sinh"),
            Contains("mã sinh viên"),
            Contains("ma sv"),
            Contains("ma so"),
            Contains("mssv"),
            Contains("student id"),
            Contains("studentid"),
            Exact("id"),
            Exact("mã"),
            Exact("ma"),
            Exact("sid"),
        ],
    },
    ColumnRule {
        field: CanonicalField::FirstName,
        keywords: &[
            Contains("first name"),
            Contains("firstname"),
            Contains("given name"),
            Exact("tên"),
            Exact("ten"),
        ],
    },
    ColumnRule {
        field: CanonicalField::LastName,
        keywords: &[
            Contains("last name"),
            Contains("lastname"),
            Contains("surname"),
            Contains("family name"),
            Contains("họ đệm"),
            Contains("ho dem"),
            Exact("họ"),
            Exact("ho"),
        ],
    },
    ColumnRule {
        field: CanonicalField::FullName,
        keywords: &[
            Contains("họ tên"),
            Contains("họ và tên"),
            Contains("ho ten"),
            Contains("ho va ten"),
            Contains("full name"),
            Contains("fullname"),
            Contains("tên sinh viên"),
            Contains("name"),
        ],
    },
    ColumnRule {
        field: CanonicalField::Email,
        keywords: &[
            Contains("email"),
            Contains("e mail"),
            Contains("thư điện tử"),
            Contains("thu dien tu"),
            Exact("mail"),
        ],
    },
    ColumnRule {
        field: CanonicalField::BirthDate,
        keywords: &[
            Contains("ngày sinh"),
            Contains("ngay sinh"),
            Contains("sinh nhật"),
            Contains("birth"),
            Exact("dob"),
        ],
    },
    ColumnRule {
        field: CanonicalField::Hometown,
        keywords: &[
            Contains("quê quán"),
            Contains("que quan"),
            Contains("quê"),
            Contains("hometown"),
            Contains("home town"),
            Contains("địa chỉ"),
            Contains("dia chi"),
            Contains("nơi sinh"),
            Contains("noi sinh"),
            Contains("address"),
            Contains("province"),
        ],
    },
    ColumnRule {
        field: CanonicalField::MathScore,
        keywords: &[Contains("toán"), Contains("toan"), Contains("math")],
    },
    ColumnRule {
        field: CanonicalField::LiteratureScore,
        keywords: &[
            Contains("văn"),
            Contains("diem van"),
            Contains("ngu van"),
            Contains("literature"),
            Exact("van"),
            Exact("lit"),
        ],
    },
    ColumnRule {
        field: CanonicalField::EnglishScore,
        keywords: &[
            Contains("tiếng anh"),
            Contains("tieng anh"),
            Contains("điểm anh"),
            Contains("diem anh"),
            Contains("english"),
            Exact("anh"),
            Exact("eng"),
        ],
    },
];

/// A row whose joined lowercase text contains one of these is a header row
pub static HEADER_INDICATORS: &[&str] = &[
    "mã sv",
    "mã số",
    "ma sv",
    "mssv",
    "họ tên",
    "họ và tên",
    "ho ten",
    "email",
    "điểm",
    "diem",
    "student id",
    "student_id",
    "name",
    "score",
    "ngày sinh",
    "quê quán",
];

/// Text of rows that only hold row controls
pub static ACTION_WORDS: &[&str] = &[
    "edit",
    "delete",
    "view",
    "sửa",
    "xóa",
    "xoá",
    "xem",
    "thao tác",
];

/// Map one normalized header cell to a field using `rules`
pub fn match_header(rules: &[ColumnRule], header: &str) -> Option<CanonicalField> {
    if header.is_empty() {
        return None;
    }
    rules.iter().find(|rule| rule.matches(header)).map(|rule| rule.field)
}

pub fn is_header_text(joined_lowercase: &str) -> bool {
    HEADER_INDICATORS
        .iter()
        .any(|indicator| joined_lowercase.contains(indicator))
}

pub fn is_action_text(joined_lowercase: &str) -> bool {
    ACTION_WORDS.iter().any(|word| joined_lowercase.contains(word))
}
