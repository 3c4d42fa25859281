//! Property tests for the table heuristics and field normalization

use proptest::prelude::*;
use student_crawler::application::normalizer::{FieldNormalizer, normalize_score, normalize_student_id};
use student_crawler::domain::RawRecord;
use student_crawler::infrastructure::TableHeuristicExtractor;

const HEADERS: [&str; 3] = ["Mã SV", "Họ tên", "Điểm Toán"];

fn table(order: &[usize], rows: &[[String; 3]]) -> String {
    let header: String = order.iter().map(|&i| format!("<th>{}</th>", HEADERS[i])).collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = order.iter().map(|&i| format!("<td>{}</td>", row[i])).collect();
            format!("<tr><td>☐</td>{cells}</tr>")
        })
        .collect();
    format!(r#"<table id="studentsTable"><thead><tr><th>☐</th>{header}</tr></thead><tbody>{body}</tbody></table>"#)
}

fn row_strategy() -> impl Strategy<Value = [String; 3]> {
    (
        "SV[0-9]{6,9}",
        prop::sample::select(vec!["Nguyễn Văn An", "Trần Thị Bình", "Lê Cường", "Phạm Minh Đức"]),
        0u8..=10,
    )
        .prop_map(|(id, name, score)| [id, name.to_string(), score.to_string()])
}

proptest! {
    #[test]
    fn scores_within_ten_are_kept(value in 0.0f64..=10.0) {
        prop_assert_eq!(normalize_score(&value.to_string()), Some(value));
    }

    #[test]
    fn percentage_scores_are_scaled(value in 10.0f64..=100.0) {
        prop_assume!(value > 10.0);
        prop_assert_eq!(normalize_score(&value.to_string()), Some(value / 10.0));
    }

    #[test]
    fn scores_beyond_a_hundred_are_dropped(value in 100.001f64..1.0e6) {
        prop_assert_eq!(normalize_score(&value.to_string()), None);
    }

    #[test]
    fn short_ids_are_rejected(core in "[A-Za-z0-9]{1,5}", noise in "[-. /]{0,4}") {
        let id = format!("{noise}{core}{noise}");
        prop_assert!(normalize_student_id(&id).is_err());

        let raw = RawRecord::new().with("student_id", id.as_str()).with("full_name", "Nguyễn Văn An");
        let normalized = FieldNormalizer::new().normalize(&[raw]);
        prop_assert!(normalized.records.is_empty());
        prop_assert_eq!(normalized.errors.len(), 1);
        prop_assert!(normalized.errors[0].starts_with("Row 1: Student ID"));
    }

    #[test]
    fn header_order_does_not_matter(
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
        rows in prop::collection::vec(row_strategy(), 1..6),
    ) {
        let extractor = TableHeuristicExtractor::new().unwrap();
        let canonical = extractor.extract(&table(&[0, 1, 2], &rows));
        let permuted = extractor.extract(&table(&order, &rows));

        prop_assert_eq!(&canonical, &permuted);
        prop_assert_eq!(permuted.len(), rows.len());
        for (record, row) in permuted.iter().zip(&rows) {
            prop_assert_eq!(record.get("student_id"), Some(row[0].as_str()));
            prop_assert_eq!(record.get("full_name"), Some(row[1].as_str()));
            prop_assert_eq!(record.get("math_score"), Some(row[2].as_str()));
        }
    }

    #[test]
    fn extraction_is_idempotent(rows in prop::collection::vec(row_strategy(), 0..8)) {
        let extractor = TableHeuristicExtractor::new().unwrap();
        let html = table(&[0, 1, 2], &rows);
        prop_assert_eq!(extractor.extract(&html), extractor.extract(&html));
    }
}
